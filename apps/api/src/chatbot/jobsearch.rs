//! Deterministic job search behind the chatbot's JobSearch intent.
//! No LLM involvement: skills are extracted with a fixed pattern table and
//! matched against active postings in the store.

use serde::Serialize;
use sqlx::PgPool;
use tracing::info;

use crate::errors::AppError;
use crate::models::job::JobRow;

const SEARCH_RESULT_LIMIT: i64 = 10;
const CARD_SKILL_LIMIT: usize = 3;

/// (canonical skill, spellings seen in user messages)
const SKILL_PATTERNS: [(&str, &[&str]); 8] = [
    ("react", &["react", "reactjs", "react.js"]),
    ("javascript", &["javascript", "js", "es6"]),
    ("node", &["node", "nodejs", "node.js"]),
    ("python", &["python"]),
    ("java", &["java"]),
    ("frontend", &["frontend", "front-end", "front end"]),
    ("backend", &["backend", "back-end", "back end"]),
    ("fullstack", &["fullstack", "full-stack", "full stack"]),
];

/// A compact job card rendered into chat replies.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobCard {
    pub id: String,
    pub title: String,
    pub company: String,
    pub salary: String,
    pub location: String,
    pub job_type: String,
    pub skills: String,
    pub link: String,
    pub apply_link: String,
}

impl JobCard {
    fn from_row(job: &JobRow) -> Self {
        let salary = match (job.salary_min, job.salary_max) {
            (Some(min), Some(max)) if min > 0 => format!("${min}-{max}"),
            _ => "Competitive".to_string(),
        };
        let skills = if job.required_skills.is_empty() {
            "Not specified".to_string()
        } else {
            job.required_skills[..job.required_skills.len().min(CARD_SKILL_LIMIT)].join(", ")
        };

        JobCard {
            id: job.id.to_string(),
            title: job.title.clone(),
            company: job.company.clone().unwrap_or_else(|| "Unknown".to_string()),
            salary,
            location: job.location.clone().unwrap_or_else(|| "Remote".to_string()),
            job_type: job
                .job_type
                .clone()
                .unwrap_or_else(|| "Full-time".to_string()),
            skills,
            link: format!("/job/{}", job.id),
            apply_link: format!("/job/{}/apply", job.id),
        }
    }
}

/// Extracts a canonical skill set from a free-text message. Falls back to a
/// generic developer query when nothing recognizable is mentioned.
pub fn extract_skills(message: &str) -> Vec<String> {
    let lower = message.to_lowercase();
    let mut skills: Vec<String> = SKILL_PATTERNS
        .iter()
        .filter(|(_, spellings)| spellings.iter().any(|p| lower.contains(p)))
        .map(|(skill, _)| skill.to_string())
        .collect();

    if skills.is_empty() {
        skills = vec![
            "react".to_string(),
            "javascript".to_string(),
            "developer".to_string(),
        ];
    }
    skills
}

/// Finds active postings matching the skills mentioned in a message, newest
/// first. Search failures degrade to an empty result, not an error — the
/// responder has a no-results reply for that.
pub async fn search_jobs(pool: &PgPool, message: &str) -> Result<Vec<JobCard>, AppError> {
    let skills = extract_skills(message);
    info!("Chat job search with skills: {}", skills.join(", "));

    let patterns: Vec<String> = skills.iter().map(|s| format!("%{s}%")).collect();

    let jobs = sqlx::query_as::<_, JobRow>(
        r#"
        SELECT * FROM jobs
        WHERE status = 'active'
          AND (
            required_skills && $1
            OR preferred_skills && $1
            OR title ILIKE ANY($2)
            OR description ILIKE ANY($2)
          )
        ORDER BY created_at DESC
        LIMIT $3
        "#,
    )
    .bind(&skills)
    .bind(&patterns)
    .bind(SEARCH_RESULT_LIMIT)
    .fetch_all(pool)
    .await?;

    Ok(jobs.iter().map(JobCard::from_row).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn test_extract_skills_recognizes_spellings() {
        let skills = extract_skills("Looking for React.js and Node openings");
        assert!(skills.contains(&"react".to_string()));
        assert!(skills.contains(&"node".to_string()));
    }

    #[test]
    fn test_extract_skills_default_when_unrecognized() {
        let skills = extract_skills("anything out there for me?");
        assert_eq!(skills, vec!["react", "javascript", "developer"]);
    }

    #[test]
    fn test_extract_skills_compound_terms() {
        let skills = extract_skills("full stack or front-end roles please");
        assert!(skills.contains(&"fullstack".to_string()));
        assert!(skills.contains(&"frontend".to_string()));
    }

    fn make_job() -> JobRow {
        JobRow {
            id: Uuid::new_v4(),
            title: "React Developer".to_string(),
            company: None,
            description: None,
            tags: vec![],
            required_skills: vec![
                "react".to_string(),
                "redux".to_string(),
                "typescript".to_string(),
                "graphql".to_string(),
            ],
            preferred_skills: vec![],
            industry: None,
            job_type: None,
            work_mode: None,
            location: None,
            experience_level: None,
            education_level: None,
            salary_min: None,
            salary_max: None,
            status: "active".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_job_card_defaults() {
        let card = JobCard::from_row(&make_job());
        assert_eq!(card.company, "Unknown");
        assert_eq!(card.salary, "Competitive");
        assert_eq!(card.location, "Remote");
        assert_eq!(card.job_type, "Full-time");
    }

    #[test]
    fn test_job_card_caps_displayed_skills() {
        let card = JobCard::from_row(&make_job());
        assert_eq!(card.skills, "react, redux, typescript");
    }

    #[test]
    fn test_job_card_salary_and_links() {
        let mut job = make_job();
        job.salary_min = Some(4000);
        job.salary_max = Some(6000);
        let card = JobCard::from_row(&job);
        assert_eq!(card.salary, "$4000-6000");
        assert_eq!(card.link, format!("/job/{}", job.id));
        assert_eq!(card.apply_link, format!("/job/{}/apply", job.id));
    }
}
