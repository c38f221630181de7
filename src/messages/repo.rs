use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// One direct message. Text and image are independently optional.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub text: Option<String>,
    pub image: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Full history between two users, oldest first, regardless of who
/// sent which message.
pub async fn between(db: &PgPool, a: Uuid, b: Uuid) -> anyhow::Result<Vec<Message>> {
    let rows = sqlx::query_as::<_, Message>(
        r#"
        SELECT id, sender_id, receiver_id, text, image, created_at, updated_at
        FROM messages
        WHERE (sender_id = $1 AND receiver_id = $2)
           OR (sender_id = $2 AND receiver_id = $1)
        ORDER BY created_at ASC
    "#,
    )
    .bind(a)
    .bind(b)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// Persist a new message. The foreign key on `receiver_id` rejects
/// messages to accounts that do not exist.
pub async fn create(
    db: &PgPool,
    sender_id: Uuid,
    receiver_id: Uuid,
    text: Option<&str>,
    image: Option<&str>,
) -> anyhow::Result<Message> {
    let message = sqlx::query_as::<_, Message>(
        r#"
        INSERT INTO messages (sender_id, receiver_id, text, image)
        VALUES ($1, $2, $3, $4)
        RETURNING id, sender_id, receiver_id, text, image, created_at, updated_at
        "#,
    )
    .bind(sender_id)
    .bind(receiver_id)
    .bind(text)
    .bind(image)
    .fetch_one(db)
    .await?;
    Ok(message)
}
