//! Profile Normalizer — turns a raw user row into the canonical attribute set
//! the scorer and the provider prompt need.
//!
//! Total over partial input: missing fields take policy defaults, never
//! errors. Applying it twice yields identical output.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::user::UserRow;

/// Experience tiers in ascending order. Rank drives the scorer comparison.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperienceTier {
    Entry,
    #[default]
    Mid,
    Senior,
    Executive,
}

impl ExperienceTier {
    pub fn rank(&self) -> u8 {
        match self {
            ExperienceTier::Entry => 0,
            ExperienceTier::Mid => 1,
            ExperienceTier::Senior => 2,
            ExperienceTier::Executive => 3,
        }
    }

    /// Substring-tolerant parse: "senior engineer" → Senior. Unrecognized
    /// input falls back to the policy default (Mid).
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return ExperienceTier::default();
        };
        let lower = raw.to_lowercase();
        // Most specific first: "entry" never collides, but check executive
        // before mid so "executive" is not swallowed by a default.
        if lower.contains("executive") {
            ExperienceTier::Executive
        } else if lower.contains("senior") {
            ExperienceTier::Senior
        } else if lower.contains("entry") {
            ExperienceTier::Entry
        } else if lower.contains("mid") {
            ExperienceTier::Mid
        } else {
            ExperienceTier::default()
        }
    }
}

impl fmt::Display for ExperienceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExperienceTier::Entry => "entry",
            ExperienceTier::Mid => "mid",
            ExperienceTier::Senior => "senior",
            ExperienceTier::Executive => "executive",
        };
        f.write_str(s)
    }
}

/// Education tiers in ascending order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EducationTier {
    HighSchool,
    Associate,
    #[default]
    Bachelor,
    Master,
    Doctorate,
}

impl EducationTier {
    pub fn rank(&self) -> u8 {
        match self {
            EducationTier::HighSchool => 0,
            EducationTier::Associate => 1,
            EducationTier::Bachelor => 2,
            EducationTier::Master => 3,
            EducationTier::Doctorate => 4,
        }
    }

    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return EducationTier::default();
        };
        let lower = raw.to_lowercase();
        if lower.contains("doctor") || lower.contains("phd") {
            EducationTier::Doctorate
        } else if lower.contains("master") {
            EducationTier::Master
        } else if lower.contains("bachelor") {
            EducationTier::Bachelor
        } else if lower.contains("associate") {
            EducationTier::Associate
        } else if lower.contains("high") {
            EducationTier::HighSchool
        } else {
            EducationTier::default()
        }
    }
}

impl fmt::Display for EducationTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EducationTier::HighSchool => "high school",
            EducationTier::Associate => "associate",
            EducationTier::Bachelor => "bachelor",
            EducationTier::Master => "master",
            EducationTier::Doctorate => "doctorate",
        };
        f.write_str(s)
    }
}

/// The normalized user attribute set. Built fresh per match request —
/// never persisted on its own (it is embedded in the match-run row for
/// auditability).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchProfile {
    /// Lower-cased, deduplicated. BTreeSet keeps iteration deterministic.
    pub skills: BTreeSet<String>,
    pub desired_job_title: String,
    pub current_job_title: String,
    pub experience: ExperienceTier,
    pub education: EducationTier,
    pub industry: String,
    pub preferred_job_type: String,
    pub preferred_location: String,
    /// Monthly, >= 0. Zero means "not specified".
    pub expected_salary: i64,
    pub certifications: BTreeSet<String>,
}

impl MatchProfile {
    pub fn from_user(user: &UserRow) -> Self {
        // Skills fall back to free-form tags when the user never filled in
        // the skills field (legacy accounts).
        let raw_skills = if user.skills.is_empty() {
            &user.tags
        } else {
            &user.skills
        };

        MatchProfile {
            skills: normalize_terms(raw_skills),
            desired_job_title: non_empty_or(&user.desired_job_title, "Job Seeker"),
            current_job_title: non_empty_or(&user.current_job_title, ""),
            experience: ExperienceTier::parse(user.years_of_experience.as_deref()),
            education: EducationTier::parse(user.education.as_deref()),
            industry: non_empty_or(&user.industry, "technology"),
            preferred_job_type: non_empty_or(&user.preferred_job_type, "full-time")
                .to_lowercase(),
            preferred_location: non_empty_or(&user.preferred_location, "remote").to_lowercase(),
            expected_salary: user.expected_salary.unwrap_or(0).max(0),
            certifications: normalize_terms(&user.certifications),
        }
    }
}

/// Lower-cases, trims, and deduplicates a raw term list. Empty entries drop.
fn normalize_terms(raw: &[String]) -> BTreeSet<String> {
    raw.iter()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn non_empty_or(raw: &Option<String>, default: &str) -> String {
    match raw.as_deref().map(str::trim) {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => default.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn make_user() -> UserRow {
        UserRow {
            id: Uuid::new_v4(),
            email: "seeker@example.com".to_string(),
            full_name: Some("Test Seeker".to_string()),
            skills: vec![
                "React".to_string(),
                "  react ".to_string(),
                "JavaScript".to_string(),
                "".to_string(),
            ],
            tags: vec!["python".to_string()],
            desired_job_title: None,
            current_job_title: None,
            preferred_job_type: Some("Full-Time".to_string()),
            preferred_location: None,
            expected_salary: Some(-200),
            years_of_experience: Some("Senior Engineer".to_string()),
            education: None,
            industry: Some("".to_string()),
            certifications: vec![],
            is_premium: false,
            ai_credits: 0,
            current_plan: None,
            role: None,
            last_ai_chat: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_skills_lowercased_and_deduplicated() {
        let profile = MatchProfile::from_user(&make_user());
        assert_eq!(
            profile.skills.iter().cloned().collect::<Vec<_>>(),
            vec!["javascript".to_string(), "react".to_string()]
        );
    }

    #[test]
    fn test_tags_used_when_skills_empty() {
        let mut user = make_user();
        user.skills = vec![];
        let profile = MatchProfile::from_user(&user);
        assert!(profile.skills.contains("python"));
    }

    #[test]
    fn test_policy_defaults_for_missing_fields() {
        let mut user = make_user();
        user.years_of_experience = None;
        user.education = None;
        let profile = MatchProfile::from_user(&user);
        assert_eq!(profile.experience, ExperienceTier::Mid);
        assert_eq!(profile.education, EducationTier::Bachelor);
        assert_eq!(profile.desired_job_title, "Job Seeker");
        assert_eq!(profile.industry, "technology");
        assert_eq!(profile.preferred_job_type, "full-time");
        assert_eq!(profile.preferred_location, "remote");
    }

    #[test]
    fn test_negative_salary_coerced_to_zero() {
        let profile = MatchProfile::from_user(&make_user());
        assert_eq!(profile.expected_salary, 0);
    }

    #[test]
    fn test_substring_tier_parsing() {
        assert_eq!(
            ExperienceTier::parse(Some("Senior Engineer")),
            ExperienceTier::Senior
        );
        assert_eq!(
            ExperienceTier::parse(Some("entry-level")),
            ExperienceTier::Entry
        );
        assert_eq!(
            ExperienceTier::parse(Some("10 years of wizardry")),
            ExperienceTier::Mid
        );
        assert_eq!(
            EducationTier::parse(Some("Master of Science")),
            EducationTier::Master
        );
        assert_eq!(
            EducationTier::parse(Some("PhD candidate")),
            EducationTier::Doctorate
        );
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let user = make_user();
        let once = MatchProfile::from_user(&user);
        let twice = MatchProfile::from_user(&user);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_tier_ordering() {
        assert!(ExperienceTier::Entry.rank() < ExperienceTier::Mid.rank());
        assert!(ExperienceTier::Mid.rank() < ExperienceTier::Senior.rank());
        assert!(ExperienceTier::Senior.rank() < ExperienceTier::Executive.rank());
        assert!(EducationTier::HighSchool.rank() < EducationTier::Associate.rank());
        assert!(EducationTier::Master.rank() < EducationTier::Doctorate.rank());
    }
}
