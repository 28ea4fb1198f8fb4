use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A job posting row. Owned by the posting CRUD surface — the matching core
/// only ever reads these, and only rows with `status = 'active'`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobRow {
    pub id: Uuid,
    pub title: String,
    pub company: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub required_skills: Vec<String>,
    pub preferred_skills: Vec<String>,
    pub industry: Option<String>,
    pub job_type: Option<String>,
    pub work_mode: Option<String>,
    pub location: Option<String>,
    pub experience_level: Option<String>,
    pub education_level: Option<String>,
    pub salary_min: Option<i64>,
    pub salary_max: Option<i64>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// Loads the point-in-time snapshot of active postings used for one match run.
/// No transaction — match results are advisory, concurrent edits are tolerated.
pub async fn list_active_jobs(pool: &sqlx::PgPool) -> Result<Vec<JobRow>, sqlx::Error> {
    sqlx::query_as::<_, JobRow>(
        "SELECT * FROM jobs WHERE status = 'active' ORDER BY created_at DESC",
    )
    .fetch_all(pool)
    .await
}
