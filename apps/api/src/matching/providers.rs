//! External Matching Provider Chain.
//!
//! An ordered list of remote providers is tried sequentially; the first one
//! returning a non-empty, valid match list wins. Every failure mode
//! (transport, non-2xx, malformed JSON, missing fields) is absorbed here —
//! logged, never propagated — and the chain reports exhaustion as a value.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::llm_client::{ChatOptions, LlmClient, LlmError};
use crate::matching::profile::MatchProfile;
use crate::matching::prompts::{build_matching_prompt, MATCHING_SYSTEM};
use crate::matching::scoring::{RESULT_LIMIT, RETENTION_FLOOR};
use crate::models::job::JobRow;
use crate::models::matching::JobMatch;

/// Remote models tried in priority order.
pub const PROVIDER_MODELS: [&str; 3] = [
    "llama-3.3-70b-versatile",
    "mixtral-8x7b-32768",
    "llama-3.1-8b-instant",
];

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider call failed: {0}")]
    Call(#[from] LlmError),

    #[error("provider returned no usable matches")]
    EmptyResult,
}

/// One remote matching strategy. Implementations must fail closed: any
/// transport or parse problem becomes a `ProviderError`, never a panic.
#[async_trait]
pub trait MatchProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn attempt_match(
        &self,
        profile: &MatchProfile,
        jobs: &[JobRow],
    ) -> Result<Vec<JobMatch>, ProviderError>;
}

#[derive(Debug, Deserialize)]
struct MatchedJobsEnvelope {
    #[serde(rename = "matchedJobs", default)]
    matched_jobs: Vec<JobMatch>,
}

/// A Groq-hosted model acting as one link of the chain.
pub struct GroqMatchProvider {
    client: LlmClient,
    model: &'static str,
}

impl GroqMatchProvider {
    pub fn new(client: LlmClient, model: &'static str) -> Self {
        Self { client, model }
    }
}

#[async_trait]
impl MatchProvider for GroqMatchProvider {
    fn name(&self) -> &str {
        self.model
    }

    async fn attempt_match(
        &self,
        profile: &MatchProfile,
        jobs: &[JobRow],
    ) -> Result<Vec<JobMatch>, ProviderError> {
        let prompt = build_matching_prompt(profile, jobs);
        let opts = ChatOptions {
            model: self.model,
            temperature: 0.3,
            max_tokens: 4000,
            json_mode: true,
        };

        let envelope: MatchedJobsEnvelope = self
            .client
            .chat_json(MATCHING_SYSTEM, &prompt, &opts)
            .await?;

        let matches = sanitize_matches(envelope.matched_jobs);
        if matches.is_empty() {
            return Err(ProviderError::EmptyResult);
        }
        Ok(matches)
    }
}

/// Runs the chain. Returns `None` on exhaustion (all providers failed or
/// returned empty) — the caller then falls back to deterministic scoring.
pub async fn run_chain(
    providers: &[std::sync::Arc<dyn MatchProvider>],
    profile: &MatchProfile,
    jobs: &[JobRow],
) -> Option<Vec<JobMatch>> {
    for provider in providers {
        info!("Trying matching provider: {}", provider.name());
        match provider.attempt_match(profile, jobs).await {
            Ok(matches) => {
                info!(
                    "Provider {} succeeded with {} matches",
                    provider.name(),
                    matches.len()
                );
                return Some(matches);
            }
            Err(e) => {
                warn!("Provider {} skipped: {e}", provider.name());
            }
        }
    }
    None
}

/// Enforces the result invariants on provider output, which is untrusted:
/// scores clamped to [0, 100], sub-floor entries dropped, feedback lists
/// capped, sorted descending, at most `RESULT_LIMIT` entries.
pub fn sanitize_matches(raw: Vec<JobMatch>) -> Vec<JobMatch> {
    let mut matches: Vec<JobMatch> = raw
        .into_iter()
        .filter_map(|mut m| {
            if m.job_id.trim().is_empty() {
                return None;
            }
            m.match_score = m.match_score.min(100);
            if m.match_score < RETENTION_FLOOR {
                return None;
            }
            m.reasons.truncate(4);
            m.strengths.truncate(3);
            m.improvements.truncate(2);
            Some(m)
        })
        .collect();

    matches.sort_by(|a, b| b.match_score.cmp(&a.match_score));
    matches.truncate(RESULT_LIMIT);
    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::profile::{EducationTier, ExperienceTier};
    use crate::models::matching::{FitAnalysis, Recommendation};
    use std::collections::BTreeSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn make_profile() -> MatchProfile {
        MatchProfile {
            skills: BTreeSet::new(),
            desired_job_title: "Dev".to_string(),
            current_job_title: String::new(),
            experience: ExperienceTier::Mid,
            education: EducationTier::Bachelor,
            industry: "technology".to_string(),
            preferred_job_type: "full-time".to_string(),
            preferred_location: "remote".to_string(),
            expected_salary: 0,
            certifications: BTreeSet::new(),
        }
    }

    fn make_match(job_id: &str, score: u32) -> JobMatch {
        JobMatch {
            job_id: job_id.to_string(),
            match_score: score,
            reasons: vec!["r".to_string(); 6],
            strengths: vec!["s".to_string(); 5],
            improvements: vec!["i".to_string(); 4],
            fit_analysis: FitAnalysis::default(),
            recommendation: Recommendation::from_score(score),
        }
    }

    /// Scripted provider for chain tests: either fails or returns a fixed
    /// list, counting invocations.
    struct ScriptedProvider {
        name: &'static str,
        result: Option<Vec<JobMatch>>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl MatchProvider for ScriptedProvider {
        fn name(&self) -> &str {
            self.name
        }

        async fn attempt_match(
            &self,
            _profile: &MatchProfile,
            _jobs: &[JobRow],
        ) -> Result<Vec<JobMatch>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.result {
                Some(matches) if !matches.is_empty() => Ok(matches.clone()),
                Some(_) => Err(ProviderError::EmptyResult),
                None => Err(ProviderError::Call(LlmError::EmptyContent)),
            }
        }
    }

    fn scripted(
        name: &'static str,
        result: Option<Vec<JobMatch>>,
    ) -> (Arc<dyn MatchProvider>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Arc::new(ScriptedProvider {
                name,
                result,
                calls: calls.clone(),
            }),
            calls,
        )
    }

    #[tokio::test]
    async fn test_chain_stops_at_first_success() {
        let (p1, c1) = scripted("first", Some(vec![make_match("a", 80)]));
        let (p2, c2) = scripted("second", Some(vec![make_match("b", 90)]));

        let result = run_chain(&[p1, p2], &make_profile(), &[]).await.unwrap();
        assert_eq!(result[0].job_id, "a");
        assert_eq!(c1.load(Ordering::SeqCst), 1);
        assert_eq!(c2.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_chain_skips_failures_and_empties() {
        let (p1, _) = scripted("failing", None);
        let (p2, _) = scripted("empty", Some(vec![]));
        let (p3, c3) = scripted("working", Some(vec![make_match("c", 75)]));

        let result = run_chain(&[p1, p2, p3], &make_profile(), &[])
            .await
            .unwrap();
        assert_eq!(result[0].job_id, "c");
        assert_eq!(c3.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_chain_exhaustion_is_none_not_error() {
        let (p1, _) = scripted("failing", None);
        let (p2, _) = scripted("empty", Some(vec![]));

        assert!(run_chain(&[p1, p2], &make_profile(), &[]).await.is_none());
    }

    #[tokio::test]
    async fn test_empty_chain_is_exhausted() {
        assert!(run_chain(&[], &make_profile(), &[]).await.is_none());
    }

    #[test]
    fn test_sanitize_drops_sub_floor_and_sorts() {
        let raw = vec![
            make_match("low", 59),
            make_match("mid", 70),
            make_match("high", 95),
        ];
        let cleaned = sanitize_matches(raw);
        assert_eq!(cleaned.len(), 2);
        assert_eq!(cleaned[0].job_id, "high");
        assert_eq!(cleaned[1].job_id, "mid");
    }

    #[test]
    fn test_sanitize_clamps_scores_and_caps_lists() {
        let cleaned = sanitize_matches(vec![make_match("wild", 400)]);
        assert_eq!(cleaned[0].match_score, 100);
        assert_eq!(cleaned[0].reasons.len(), 4);
        assert_eq!(cleaned[0].strengths.len(), 3);
        assert_eq!(cleaned[0].improvements.len(), 2);
    }

    #[test]
    fn test_sanitize_caps_result_count() {
        let raw: Vec<JobMatch> = (0..25).map(|i| make_match(&format!("j{i}"), 80)).collect();
        assert_eq!(sanitize_matches(raw).len(), 10);
    }

    #[test]
    fn test_sanitize_drops_blank_job_ids() {
        let cleaned = sanitize_matches(vec![make_match("  ", 90), make_match("ok", 90)]);
        assert_eq!(cleaned.len(), 1);
        assert_eq!(cleaned[0].job_id, "ok");
    }

    #[test]
    fn test_envelope_parses_provider_shape() {
        let json = r#"{
            "matchedJobs": [{
                "jobId": "abc",
                "matchScore": 85,
                "reasons": ["Skills align"],
                "strengths": ["React depth"],
                "improvements": ["More backend"],
                "fitAnalysis": {
                    "skills": 90, "experience": 85, "education": 75,
                    "salary": 80, "location": 95, "culture": 70
                },
                "recommendation": "Highly recommended"
            }]
        }"#;
        let envelope: MatchedJobsEnvelope = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.matched_jobs.len(), 1);
        assert_eq!(envelope.matched_jobs[0].job_id, "abc");
        assert_eq!(
            envelope.matched_jobs[0].recommendation,
            Recommendation::HighlyRecommended
        );
    }

    #[test]
    fn test_envelope_missing_field_defaults_empty() {
        let envelope: MatchedJobsEnvelope = serde_json::from_str("{}").unwrap();
        assert!(envelope.matched_jobs.is_empty());
    }
}
