use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

/// Failure taxonomy for every public operation. Anything unexpected
/// collapses into `Internal`, which logs the cause and answers with a
/// fixed message so collaborator details never reach the client.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Client input malformed; carries every violation, not just the first.
    #[error("validation failed")]
    Validation(Vec<String>),
    /// Uniqueness violation reported to the client as-is.
    #[error("{0}")]
    Conflict(String),
    /// Unknown account and wrong password answer identically.
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Validation(messages) => {
                (StatusCode::BAD_REQUEST, json!({ "message": messages }))
            }
            ApiError::Conflict(message) => (StatusCode::BAD_REQUEST, json!({ "message": message })),
            ApiError::InvalidCredentials => (
                StatusCode::NOT_FOUND,
                json!({ "message": "invalid credentials" }),
            ),
            ApiError::Unauthorized(message) => {
                (StatusCode::UNAUTHORIZED, json!({ "message": message }))
            }
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, json!({ "message": message })),
            ApiError::Internal(err) => {
                error!(error = ?err, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "message": "Internal server error" }),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

fn db_error_kind(err: &anyhow::Error) -> Option<sqlx::error::ErrorKind> {
    match err.downcast_ref::<sqlx::Error>() {
        Some(sqlx::Error::Database(db)) => Some(db.kind()),
        _ => None,
    }
}

/// True when the store rejected a write on a unique index. The store is
/// the authoritative uniqueness guard; pre-checks are advisory only.
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    matches!(db_error_kind(err), Some(sqlx::error::ErrorKind::UniqueViolation))
}

/// True when the store rejected a write referencing a missing row.
pub fn is_foreign_key_violation(err: &anyhow::Error) -> bool {
    matches!(
        db_error_kind(err),
        Some(sqlx::error::ErrorKind::ForeignKeyViolation)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(err: ApiError) -> (StatusCode, serde_json::Value) {
        let resp = err.into_response();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn validation_reports_every_message() {
        let (status, body) = body_json(ApiError::Validation(vec![
            "Name is required".into(),
            "Email is required".into(),
        ]))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["message"],
            serde_json::json!(["Name is required", "Email is required"])
        );
    }

    #[tokio::test]
    async fn conflict_is_bad_request_with_message() {
        let (status, body) = body_json(ApiError::Conflict("email already exists".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "email already exists");
    }

    #[tokio::test]
    async fn invalid_credentials_has_fixed_status_and_message() {
        let (status, body) = body_json(ApiError::InvalidCredentials).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "invalid credentials");
    }

    #[tokio::test]
    async fn internal_hides_the_cause() {
        let cause = anyhow::anyhow!("connection refused at 10.0.0.3:5432");
        let (status, body) = body_json(ApiError::Internal(cause)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Internal server error");
        assert!(!body.to_string().contains("10.0.0.3"));
    }

    #[test]
    fn non_database_errors_are_not_violations() {
        let err = anyhow::Error::from(sqlx::Error::RowNotFound);
        assert!(!is_unique_violation(&err));
        assert!(!is_foreign_key_violation(&err));
    }
}
