//! Chat transcript and usage-counter rows.
//!
//! The transcript (`chat_messages`) is display history. The free-message
//! counter lives in `chat_usage` and is the single source of truth for the
//! access gate — it is monotonic and survives a "clear chat", so clearing the
//! transcript never replenishes free messages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const ROLE_USER: &str = "user";
pub const ROLE_ASSISTANT: &str = "assistant";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ChatMessageRow {
    pub id: Uuid,
    pub user_email: String,
    pub role: String,
    pub content: String,
    #[serde(rename = "timestamp")]
    pub created_at: DateTime<Utc>,
}

/// Full transcript for one user, oldest first.
pub async fn list_messages(
    pool: &sqlx::PgPool,
    user_email: &str,
) -> Result<Vec<ChatMessageRow>, sqlx::Error> {
    sqlx::query_as::<_, ChatMessageRow>(
        "SELECT * FROM chat_messages WHERE user_email = $1 ORDER BY created_at ASC",
    )
    .bind(user_email)
    .fetch_all(pool)
    .await
}

/// Most recent messages for prompt context, oldest first within the window.
pub async fn recent_messages(
    pool: &sqlx::PgPool,
    user_email: &str,
    limit: i64,
) -> Result<Vec<ChatMessageRow>, sqlx::Error> {
    let mut rows = sqlx::query_as::<_, ChatMessageRow>(
        "SELECT * FROM chat_messages WHERE user_email = $1 ORDER BY created_at DESC LIMIT $2",
    )
    .bind(user_email)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    rows.reverse();
    Ok(rows)
}

/// Appends one message to the transcript and returns the stored row.
pub async fn append_message(
    pool: &sqlx::PgPool,
    user_email: &str,
    role: &str,
    content: &str,
) -> Result<ChatMessageRow, sqlx::Error> {
    sqlx::query_as::<_, ChatMessageRow>(
        r#"
        INSERT INTO chat_messages (user_email, role, content)
        VALUES ($1, $2, $3)
        RETURNING *
        "#,
    )
    .bind(user_email)
    .bind(role)
    .bind(content)
    .fetch_one(pool)
    .await
}

/// Deletes the displayed transcript. Leaves `chat_usage` untouched — clearing
/// history is cosmetic and grants no fresh free messages.
pub async fn clear_messages(pool: &sqlx::PgPool, user_email: &str) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM chat_messages WHERE user_email = $1")
        .bind(user_email)
        .execute(pool)
        .await?;
    Ok(())
}
