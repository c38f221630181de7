use anyhow::Context;
use serde::Deserialize;

/// Session token settings. The signing secret is injected here instead of
/// being read from the environment at signing time.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_days: i64,
    pub cookie_secure: bool,
}

/// S3-compatible media store settings. `public_base_url` overrides the
/// default `endpoint/bucket` prefix used for stored image URLs.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaConfig {
    pub endpoint: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
    pub public_base_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub client_origin: String,
    pub jwt: JwtConfig,
    pub media: MediaConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let client_origin =
            std::env::var("CLIENT_ORIGIN").unwrap_or_else(|_| "http://localhost:5173".into());
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET is not set")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "chatterbox".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "chatterbox-users".into()),
            ttl_days: std::env::var("JWT_TTL_DAYS")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(7),
            cookie_secure: std::env::var("COOKIE_SECURE")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
        };
        let media = MediaConfig {
            endpoint: std::env::var("MEDIA_ENDPOINT").context("MEDIA_ENDPOINT is not set")?,
            bucket: std::env::var("MEDIA_BUCKET").context("MEDIA_BUCKET is not set")?,
            access_key: std::env::var("MEDIA_ACCESS_KEY").context("MEDIA_ACCESS_KEY is not set")?,
            secret_key: std::env::var("MEDIA_SECRET_KEY").context("MEDIA_SECRET_KEY is not set")?,
            region: std::env::var("MEDIA_REGION").unwrap_or_else(|_| "us-east-1".into()),
            public_base_url: std::env::var("MEDIA_PUBLIC_URL").ok(),
        };
        Ok(Self {
            database_url,
            client_origin,
            jwt,
            media,
        })
    }
}
