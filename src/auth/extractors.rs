use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::warn;

use crate::{
    auth::{
        jwt::{JwtKeys, SESSION_COOKIE},
        repo_types::User,
    },
    error::ApiError,
    state::AppState,
};

/// Extracts and validates the session cookie, loading the full user
/// record behind it.
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Read the session cookie
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar
            .get(SESSION_COOKIE)
            .map(|cookie| cookie.value())
            .ok_or_else(|| ApiError::Unauthorized("no session token provided".into()))?;

        // Validate the JWT
        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify(token).map_err(|e| {
            warn!(error = %e, "session token rejected");
            ApiError::Unauthorized("invalid or expired session token".into())
        })?;

        // Load the account behind the token
        let user = User::find_by_id(&state.db, claims.sub)
            .await?
            .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

        Ok(CurrentUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, Request};

    fn parts_with_headers(cookie: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/auth/check");
        if let Some(value) = cookie {
            builder = builder.header(header::COOKIE, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn missing_cookie_is_unauthorized() {
        let state = AppState::fake();
        let mut parts = parts_with_headers(None);

        let err = CurrentUser::from_request_parts(&mut parts, &state)
            .await
            .err()
            .unwrap();
        match err {
            ApiError::Unauthorized(msg) => assert_eq!(msg, "no session token provided"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn garbage_token_is_unauthorized() {
        let state = AppState::fake();
        let mut parts = parts_with_headers(Some("jwt=not-a-real-token"));

        let err = CurrentUser::from_request_parts(&mut parts, &state)
            .await
            .err()
            .unwrap();
        match err {
            ApiError::Unauthorized(msg) => assert_eq!(msg, "invalid or expired session token"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unrelated_cookies_are_ignored() {
        let state = AppState::fake();
        let mut parts = parts_with_headers(Some("session=abc; theme=dark"));

        let err = CurrentUser::from_request_parts(&mut parts, &state)
            .await
            .err()
            .unwrap();
        match err {
            ApiError::Unauthorized(msg) => assert_eq!(msg, "no session token provided"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
