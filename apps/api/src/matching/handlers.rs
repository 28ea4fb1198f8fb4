//! Axum route handlers for the Matching API.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::matching::orchestrator::run_match;
use crate::models::matching::{get_match_run, list_match_runs, JobMatch, MatchRunRow};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRequest {
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResponse {
    pub matches: Vec<JobMatch>,
    pub total_matches: usize,
    pub match_id: Uuid,
    pub algorithm: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct MatchHistoryQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct MatchHistoryResponse {
    pub matches: Vec<MatchRunRow>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/match
///
/// Runs the full matching pipeline for a user and persists the match run.
pub async fn handle_match(
    State(state): State<AppState>,
    Json(request): Json<MatchRequest>,
) -> Result<Json<MatchResponse>, AppError> {
    let raw_id = request
        .user_id
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::Validation("userId is required".to_string()))?;

    let user_id = Uuid::parse_str(raw_id)
        .map_err(|_| AppError::Validation("userId must be a valid UUID".to_string()))?;

    let outcome = run_match(&state.db, &state.providers, user_id).await?;

    Ok(Json(MatchResponse {
        total_matches: outcome.matches.len(),
        match_id: outcome.match_id,
        algorithm: outcome.algorithm.as_str(),
        matches: outcome.matches,
    }))
}

/// GET /api/v1/match/user/:user_id/matches?limit=10
///
/// Match-run history for a user, newest first.
pub async fn handle_user_matches(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Query(query): Query<MatchHistoryQuery>,
) -> Result<Json<MatchHistoryResponse>, AppError> {
    let limit = query.limit.unwrap_or(10).clamp(1, 100);
    let matches = list_match_runs(&state.db, user_id, limit).await?;
    Ok(Json(MatchHistoryResponse { matches }))
}

/// GET /api/v1/match/:match_id
///
/// One persisted match run.
pub async fn handle_get_match(
    State(state): State<AppState>,
    Path(match_id): Path<Uuid>,
) -> Result<Json<MatchRunRow>, AppError> {
    let run = get_match_run(&state.db, match_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Match result {match_id} not found")))?;
    Ok(Json(run))
}
