//! Match Orchestrator — end-to-end handling of one match request.
//!
//! Provider chain first; deterministic scoring when the chain is exhausted.
//! A match request never fails outright once the user resolves: the caller
//! always gets a best-effort result set.

use std::sync::Arc;

use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::matching::profile::MatchProfile;
use crate::matching::providers::{run_chain, MatchProvider};
use crate::matching::scoring::score_corpus;
use crate::models::job::{list_active_jobs, JobRow};
use crate::models::matching::{save_match_run, JobMatch, MatchAlgorithm};
use crate::models::user::get_user_by_id;

/// The outcome of one match run, already persisted.
pub struct MatchRunOutcome {
    pub match_id: Uuid,
    pub matches: Vec<JobMatch>,
    pub algorithm: MatchAlgorithm,
}

pub async fn run_match(
    pool: &PgPool,
    providers: &[Arc<dyn MatchProvider>],
    user_id: Uuid,
) -> Result<MatchRunOutcome, AppError> {
    let user = get_user_by_id(pool, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let jobs = list_active_jobs(pool).await?;
    info!("Found {} active jobs for matching", jobs.len());

    let profile = MatchProfile::from_user(&user);

    let chain_result = run_chain(providers, &profile, &jobs).await;
    let (matches, algorithm) = resolve_matches(chain_result, &profile, &jobs);

    let profile_json = serde_json::to_value(&profile)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("profile serialization: {e}")))?;

    let match_id = save_match_run(pool, user_id, &profile_json, &matches, algorithm).await?;
    info!(
        "Match run {} saved: {} matches via {}",
        match_id,
        matches.len(),
        algorithm.as_str()
    );

    Ok(MatchRunOutcome {
        match_id,
        matches,
        algorithm,
    })
}

/// Picks the result set and its algorithm tag: chain output is used as-is
/// and tagged provider-enhanced; exhaustion falls back to deterministic
/// scoring tagged basic-fallback.
fn resolve_matches(
    chain_result: Option<Vec<JobMatch>>,
    profile: &MatchProfile,
    jobs: &[JobRow],
) -> (Vec<JobMatch>, MatchAlgorithm) {
    match chain_result {
        Some(matches) => (matches, MatchAlgorithm::ProviderEnhanced),
        None => {
            info!("Provider chain exhausted, using basic fallback scoring");
            (score_corpus(profile, jobs), MatchAlgorithm::BasicFallback)
        }
    }
}
