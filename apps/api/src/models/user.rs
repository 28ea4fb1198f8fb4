use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A job-seeker account row. Raw profile fields are nullable on purpose —
/// the matching profile normalizer supplies policy defaults, never errors.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub skills: Vec<String>,
    pub tags: Vec<String>,
    pub desired_job_title: Option<String>,
    pub current_job_title: Option<String>,
    pub preferred_job_type: Option<String>,
    pub preferred_location: Option<String>,
    /// Monthly figure. Non-positive or absent means "not specified".
    pub expected_salary: Option<i64>,
    pub years_of_experience: Option<String>,
    pub education: Option<String>,
    pub industry: Option<String>,
    pub certifications: Vec<String>,
    pub is_premium: bool,
    pub ai_credits: i64,
    pub current_plan: Option<String>,
    pub role: Option<String>,
    pub last_ai_chat: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Fetches a user by id.
pub async fn get_user_by_id(
    pool: &sqlx::PgPool,
    id: Uuid,
) -> Result<Option<UserRow>, sqlx::Error> {
    sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Fetches a user by email (chat surfaces are keyed by email).
pub async fn get_user_by_email(
    pool: &sqlx::PgPool,
    email: &str,
) -> Result<Option<UserRow>, sqlx::Error> {
    sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await
}
