use axum::{
    extract::{DefaultBodyLimit, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{extractors::CurrentUser, repo_types::User},
    error::{is_foreign_key_violation, ApiError},
    media::store_image,
    state::AppState,
};

use super::dto::SendMessageRequest;
use super::repo::{self, Message};

pub fn message_routes() -> Router<AppState> {
    Router::new()
        .route("/messages/users", get(sidebar_users))
        .route("/messages/:id", get(conversation))
        .route("/messages/send/:id", post(send_message))
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024)) // 10MB, base64 attachments
}

/// Everyone the caller can start a conversation with.
#[instrument(skip(state, user))]
pub async fn sidebar_users(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<User>>, ApiError> {
    let users = User::all_except(&state.db, user.id).await?;
    Ok(Json(users))
}

#[instrument(skip(state, user))]
pub async fn conversation(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(other): Path<Uuid>,
) -> Result<Json<Vec<Message>>, ApiError> {
    let messages = repo::between(&state.db, user.id, other).await?;
    Ok(Json(messages))
}

#[instrument(skip(state, user, payload))]
pub async fn send_message(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(receiver): Path<Uuid>,
    Json(payload): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<Message>), ApiError> {
    // Attachments are uploaded first so the stored row only ever
    // carries a URL, never raw image data.
    let image_url = match payload.image.as_deref().filter(|s| !s.is_empty()) {
        Some(data) => Some(store_image(state.media.as_ref(), "messages", user.id, data).await?),
        None => None,
    };

    let message = match repo::create(
        &state.db,
        user.id,
        receiver,
        payload.text.as_deref(),
        image_url.as_deref(),
    )
    .await
    {
        Ok(message) => message,
        Err(e) if is_foreign_key_violation(&e) => {
            warn!(%receiver, "message to unknown receiver");
            return Err(ApiError::NotFound("User not found".into()));
        }
        Err(e) => return Err(e.into()),
    };

    info!(message_id = %message.id, %receiver, "message sent");
    Ok((StatusCode::CREATED, Json(message)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    #[test]
    fn message_serializes_with_wire_field_names() {
        let message = Message {
            id: Uuid::new_v4(),
            sender_id: Uuid::new_v4(),
            receiver_id: Uuid::new_v4(),
            text: Some("hi".into()),
            image: None,
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
        };

        let json = serde_json::to_string(&message).unwrap();
        assert!(json.contains("\"senderId\""));
        assert!(json.contains("\"receiverId\""));
        assert!(json.contains("\"createdAt\""));
    }

    #[test]
    fn send_request_tolerates_missing_parts() {
        let parsed: SendMessageRequest = serde_json::from_str("{}").unwrap();
        assert!(parsed.text.is_none());
        assert!(parsed.image.is_none());

        let parsed: SendMessageRequest =
            serde_json::from_str(r#"{"text":"hello"}"#).unwrap();
        assert_eq!(parsed.text.as_deref(), Some("hello"));
    }
}
