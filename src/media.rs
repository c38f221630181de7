use anyhow::Context;
use async_trait::async_trait;
use aws_config::{defaults, BehaviorVersion};
use aws_credential_types::Credentials;
use aws_sdk_s3::{
    config::{Builder as S3ConfigBuilder, Region},
    Client,
};
use aws_smithy_types::byte_stream::ByteStream;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use bytes::Bytes;
use uuid::Uuid;

use crate::config::MediaConfig;

/// Object store for client-uploaded images. Implementations return a
/// stable URL; stored profile and message URLs must not expire.
#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn upload_image(&self, key: &str, body: Bytes, content_type: &str)
        -> anyhow::Result<String>;
}

#[derive(Clone)]
pub struct MediaStorage {
    client: Client,
    bucket: String,
    public_base_url: String,
}

impl MediaStorage {
    pub async fn new(cfg: &MediaConfig) -> anyhow::Result<Self> {
        let shared = defaults(BehaviorVersion::latest())
            .region(Region::new(cfg.region.clone()))
            .credentials_provider(Credentials::new(
                &cfg.access_key,
                &cfg.secret_key,
                None,
                None,
                "static",
            ))
            .endpoint_url(&cfg.endpoint)
            .load()
            .await;

        let conf = S3ConfigBuilder::from(&shared)
            .endpoint_url(&cfg.endpoint)
            .force_path_style(true)
            .build();

        let public_base_url = cfg.public_base_url.clone().unwrap_or_else(|| {
            format!("{}/{}", cfg.endpoint.trim_end_matches('/'), cfg.bucket)
        });

        Ok(Self {
            client: Client::from_conf(conf),
            bucket: cfg.bucket.clone(),
            public_base_url,
        })
    }
}

#[async_trait]
impl MediaStore for MediaStorage {
    async fn upload_image(
        &self,
        key: &str,
        body: Bytes,
        content_type: &str,
    ) -> anyhow::Result<String> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .context("s3 put_object")?;
        Ok(format!(
            "{}/{}",
            self.public_base_url.trim_end_matches('/'),
            key
        ))
    }
}

/// Decode a `data:<mime>;base64,<payload>` image. A bare base64 string is
/// accepted as an octet-stream.
pub fn parse_image_data(data: &str) -> anyhow::Result<(String, Bytes)> {
    let (content_type, payload) = match data.strip_prefix("data:") {
        Some(rest) => {
            let (mime, b64) = rest
                .split_once(";base64,")
                .context("image payload is not base64 encoded")?;
            (mime.to_string(), b64)
        }
        None => ("application/octet-stream".to_string(), data),
    };
    let bytes = BASE64
        .decode(payload.trim())
        .context("decode image payload")?;
    Ok((content_type, Bytes::from(bytes)))
}

fn ext_for_mime(ct: &str) -> &'static str {
    match ct {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        _ => "bin",
    }
}

/// Upload one client-supplied image under `prefix/owner/` and return its
/// stable URL.
pub async fn store_image(
    media: &dyn MediaStore,
    prefix: &str,
    owner: Uuid,
    data: &str,
) -> anyhow::Result<String> {
    let (content_type, bytes) = parse_image_data(data)?;
    let key = format!(
        "{}/{}/{}.{}",
        prefix,
        owner,
        Uuid::new_v4(),
        ext_for_mime(&content_type)
    );
    media.upload_image(&key, bytes, &content_type).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppState;

    #[test]
    fn parses_a_data_url() {
        let (ct, bytes) = parse_image_data("data:image/png;base64,aGVsbG8=").unwrap();
        assert_eq!(ct, "image/png");
        assert_eq!(&bytes[..], b"hello");
    }

    #[test]
    fn accepts_bare_base64_as_octet_stream() {
        let (ct, bytes) = parse_image_data("aGVsbG8=").unwrap();
        assert_eq!(ct, "application/octet-stream");
        assert_eq!(&bytes[..], b"hello");
    }

    #[test]
    fn rejects_garbage_payloads() {
        assert!(parse_image_data("data:image/png;base64,!!not-base64!!").is_err());
        assert!(parse_image_data("data:image/png,missing-marker").is_err());
    }

    #[test]
    fn maps_mime_types_to_extensions() {
        assert_eq!(ext_for_mime("image/jpeg"), "jpg");
        assert_eq!(ext_for_mime("image/jpg"), "jpg");
        assert_eq!(ext_for_mime("image/png"), "png");
        assert_eq!(ext_for_mime("image/gif"), "gif");
        assert_eq!(ext_for_mime("image/webp"), "webp");
        assert_eq!(ext_for_mime("application/pdf"), "bin");
    }

    #[tokio::test]
    async fn store_image_namespaces_the_key() {
        let state = AppState::fake();
        let owner = Uuid::new_v4();
        let url = store_image(
            state.media.as_ref(),
            "avatars",
            owner,
            "data:image/png;base64,aGVsbG8=",
        )
        .await
        .unwrap();
        assert!(url.contains(&format!("avatars/{owner}/")));
        assert!(url.ends_with(".png"));
    }
}
