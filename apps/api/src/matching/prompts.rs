//! Prompt construction for the remote matching providers.

use crate::matching::profile::MatchProfile;
use crate::models::job::JobRow;

/// Providers see at most this many candidates — prompt size control.
pub const PROMPT_JOB_LIMIT: usize = 20;

/// System prompt for remote matching — enforces JSON-only output.
pub const MATCHING_SYSTEM: &str = "You are an expert job matching AI. \
    Analyze user profiles and jobs, then return ONLY a valid JSON object \
    with matched jobs. Include match scores (60-95), detailed reasons, \
    strengths, and improvements.";

/// Builds the structured matching prompt over the first `PROMPT_JOB_LIMIT`
/// candidates. The response schema here must stay in sync with `JobMatch`.
pub fn build_matching_prompt(profile: &MatchProfile, jobs: &[JobRow]) -> String {
    let skills = join_or(profile.skills.iter(), "None");
    let certifications = join_or(profile.certifications.iter(), "None");

    let limited = &jobs[..jobs.len().min(PROMPT_JOB_LIMIT)];
    let job_blocks: String = limited
        .iter()
        .enumerate()
        .map(|(i, job)| format_job_block(i + 1, job))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"TASK: Match user with suitable jobs. Return ONLY valid JSON.

USER PROFILE:
- Desired Job: {desired}
- Current Job: {current}
- Skills: {skills}
- Experience: {experience}
- Education: {education}
- Industry: {industry}
- Job Type: {job_type}
- Location: {location}
- Expected Salary: ${salary}/month
- Certifications: {certifications}

AVAILABLE JOBS ({count}):
{job_blocks}

RETURN THIS EXACT JSON FORMAT:
{{
    "matchedJobs": [
        {{
            "jobId": "job_id_here",
            "matchScore": 85,
            "reasons": ["Specific reason 1", "Specific reason 2"],
            "strengths": ["Strength 1", "Strength 2"],
            "improvements": ["Improvement 1"],
            "fitAnalysis": {{
                "skills": 90,
                "experience": 85,
                "education": 75,
                "salary": 80,
                "location": 95,
                "culture": 70
            }},
            "recommendation": "Highly recommended"
        }}
    ]
}}

RULES:
- Only include jobs with matchScore >= 60
- matchScore: 60-95
- Provide 2-4 specific reasons
- Maximum 10 jobs
- Return ONLY valid JSON"#,
        desired = profile.desired_job_title,
        current = or_not_specified(&profile.current_job_title),
        skills = skills,
        experience = profile.experience,
        education = profile.education,
        industry = profile.industry,
        job_type = profile.preferred_job_type,
        location = profile.preferred_location,
        salary = profile.expected_salary,
        certifications = certifications,
        count = limited.len(),
        job_blocks = job_blocks,
    )
}

fn format_job_block(index: usize, job: &JobRow) -> String {
    let description: String = job
        .description
        .as_deref()
        .unwrap_or("")
        .chars()
        .take(200)
        .collect();

    format!(
        r#"JOB {index}:
- ID: {id}
- Title: {title}
- Company: {company}
- Industry: {industry}
- Type: {job_type}
- Work Mode: {work_mode}
- Location: {location}
- Experience: {experience}
- Education: {education}
- Salary: ${min} - ${max}
- Required Skills: {required}
- Preferred Skills: {preferred}
- Description: {description}...
"#,
        id = job.id,
        title = job.title,
        company = job.company.as_deref().unwrap_or("Unknown"),
        industry = job.industry.as_deref().unwrap_or("General"),
        job_type = job.job_type.as_deref().unwrap_or("full-time"),
        work_mode = job.work_mode.as_deref().unwrap_or("on-site"),
        location = job.location.as_deref().unwrap_or("Not specified"),
        experience = job.experience_level.as_deref().unwrap_or("mid"),
        education = job.education_level.as_deref().unwrap_or("bachelor"),
        min = job.salary_min.unwrap_or(0),
        max = job.salary_max.unwrap_or(0),
        required = join_or(job.required_skills.iter(), "None"),
        preferred = join_or(job.preferred_skills.iter(), "None"),
        description = description,
    )
}

fn join_or<'a>(items: impl Iterator<Item = &'a String>, default: &str) -> String {
    let joined = items.cloned().collect::<Vec<_>>().join(", ");
    if joined.is_empty() {
        default.to_string()
    } else {
        joined
    }
}

fn or_not_specified(s: &str) -> &str {
    if s.is_empty() {
        "Not specified"
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::profile::{EducationTier, ExperienceTier};
    use chrono::Utc;
    use std::collections::BTreeSet;
    use uuid::Uuid;

    fn make_profile() -> MatchProfile {
        MatchProfile {
            skills: ["react".to_string()].into_iter().collect(),
            desired_job_title: "Frontend Developer".to_string(),
            current_job_title: String::new(),
            experience: ExperienceTier::Mid,
            education: EducationTier::Bachelor,
            industry: "technology".to_string(),
            preferred_job_type: "full-time".to_string(),
            preferred_location: "remote".to_string(),
            expected_salary: 5000,
            certifications: BTreeSet::new(),
        }
    }

    fn make_job(title: &str) -> JobRow {
        JobRow {
            id: Uuid::new_v4(),
            title: title.to_string(),
            company: None,
            description: Some("x".repeat(500)),
            tags: vec![],
            required_skills: vec![],
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
    fn test_prompt_caps_candidate_count() {
        let jobs: Vec<JobRow> = (0..30).map(|i| make_job(&format!("Job {i}"))).collect();
        let prompt = build_matching_prompt(&make_profile(), &jobs);
        assert!(prompt.contains("AVAILABLE JOBS (20)"));
        assert!(prompt.contains("JOB 20:"));
        assert!(!prompt.contains("JOB 21:"));
    }

    #[test]
    fn test_prompt_truncates_long_descriptions() {
        let jobs = vec![make_job("Verbose Job")];
        let prompt = build_matching_prompt(&make_profile(), &jobs);
        // 200 chars of description plus the trailing ellipsis marker.
        assert!(!prompt.contains(&"x".repeat(201)));
        assert!(prompt.contains(&format!("{}...", "x".repeat(200))));
    }

    #[test]
    fn test_prompt_includes_profile_and_schema() {
        let jobs = vec![make_job("Job")];
        let prompt = build_matching_prompt(&make_profile(), &jobs);
        assert!(prompt.contains("Frontend Developer"));
        assert!(prompt.contains("\"matchedJobs\""));
        assert!(prompt.contains("matchScore >= 60"));
    }
}
