//! Match-run data model. One `MatchRunRow` groups the ranked `JobMatch`
//! entries produced by a single match request. Rows are append-only history:
//! inserted once, never updated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// Per-category fit breakdown, each value in [0, 100].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FitAnalysis {
    pub skills: u32,
    pub experience: u32,
    pub education: u32,
    pub salary: u32,
    pub location: u32,
    pub culture: u32,
}

/// Recommendation bucket derived from the overall score
/// (≥80 highly recommended, ≥70 good, else moderate).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    HighlyRecommended,
    GoodMatch,
    ModerateMatch,
}

impl Recommendation {
    pub fn from_score(score: u32) -> Self {
        if score >= 80 {
            Recommendation::HighlyRecommended
        } else if score >= 70 {
            Recommendation::GoodMatch
        } else {
            Recommendation::ModerateMatch
        }
    }

    /// Lenient mapping for free-text labels remote providers emit
    /// ("Highly recommended", "Good match", ...).
    fn from_label(label: &str) -> Self {
        let lower = label.to_lowercase();
        if lower.contains("high") {
            Recommendation::HighlyRecommended
        } else if lower.contains("good") {
            Recommendation::GoodMatch
        } else {
            Recommendation::ModerateMatch
        }
    }
}

// Providers do not reliably echo the snake_case tags back, so deserialization
// accepts any string and maps it onto the nearest bucket.
impl<'de> Deserialize<'de> for Recommendation {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let label = String::deserialize(deserializer)?;
        Ok(Recommendation::from_label(&label))
    }
}

/// One scored (user, job) pair within a match run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobMatch {
    pub job_id: String,
    pub match_score: u32,
    pub reasons: Vec<String>,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    pub fit_analysis: FitAnalysis,
    pub recommendation: Recommendation,
}

/// Which algorithm produced a match run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchAlgorithm {
    #[serde(rename = "provider-enhanced")]
    ProviderEnhanced,
    #[serde(rename = "basic-fallback")]
    BasicFallback,
}

impl MatchAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchAlgorithm::ProviderEnhanced => "provider-enhanced",
            MatchAlgorithm::BasicFallback => "basic-fallback",
        }
    }
}

/// A persisted match run. `matched_jobs` embeds the full result set as JSONB,
/// mirroring the wire shape returned to the client.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MatchRunRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub matched_jobs: Json<Vec<JobMatch>>,
    pub algorithm: String,
    pub total_matches: i32,
    pub match_date: DateTime<Utc>,
}

/// Inserts a new match run and returns its id. Append-only: no update path.
pub async fn save_match_run(
    pool: &sqlx::PgPool,
    user_id: Uuid,
    profile: &serde_json::Value,
    matches: &[JobMatch],
    algorithm: MatchAlgorithm,
) -> Result<Uuid, sqlx::Error> {
    let matched_jobs = serde_json::to_value(matches).unwrap_or_default();
    sqlx::query_scalar(
        r#"
        INSERT INTO match_runs (user_id, profile, matched_jobs, algorithm, total_matches)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        "#,
    )
    .bind(user_id)
    .bind(profile)
    .bind(matched_jobs)
    .bind(algorithm.as_str())
    .bind(matches.len() as i32)
    .fetch_one(pool)
    .await
}

/// Most recent match runs for a user, newest first.
pub async fn list_match_runs(
    pool: &sqlx::PgPool,
    user_id: Uuid,
    limit: i64,
) -> Result<Vec<MatchRunRow>, sqlx::Error> {
    sqlx::query_as::<_, MatchRunRow>(
        r#"
        SELECT id, user_id, matched_jobs, algorithm, total_matches, match_date
        FROM match_runs
        WHERE user_id = $1
        ORDER BY match_date DESC
        LIMIT $2
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await
}

/// Fetches one match run by id.
pub async fn get_match_run(
    pool: &sqlx::PgPool,
    id: Uuid,
) -> Result<Option<MatchRunRow>, sqlx::Error> {
    sqlx::query_as::<_, MatchRunRow>(
        r#"
        SELECT id, user_id, matched_jobs, algorithm, total_matches, match_date
        FROM match_runs
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}
