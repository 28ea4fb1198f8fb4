//! Deterministic Compatibility Scorer — the always-available fallback when no
//! remote provider succeeds. Pure arithmetic over a normalized profile and a
//! job row; no I/O, no clock, no randomness.
//!
//! Category weights are fixed and must not drift: scores are comparable
//! against persisted match-run history.
//!   skills 30% · experience 20% · education 10% · salary 15%
//!   location/work-mode 10% · job-type/culture 10% · flat growth credit 5%

use crate::matching::profile::{EducationTier, ExperienceTier, MatchProfile};
use crate::models::job::JobRow;
use crate::models::matching::{FitAnalysis, JobMatch, Recommendation};

/// Scores are capped here — 96..=100 is deliberately unreachable so the
/// system never reports false certainty.
pub const MAX_SCORE: u32 = 95;
/// Results below this are not worth surfacing and are dropped.
pub const RETENTION_FLOOR: u32 = 60;
/// Fallback scoring considers at most this many candidates per run.
pub const CANDIDATE_LIMIT: usize = 50;
/// A match run returns at most this many results.
pub const RESULT_LIMIT: usize = 10;

const MAX_REASONS: usize = 4;
const MAX_STRENGTHS: usize = 3;
const MAX_IMPROVEMENTS: usize = 2;

/// Scores one (user, job) pair. Returns `None` when the final score falls
/// below the retention floor.
pub fn score_job(profile: &MatchProfile, job: &JobRow) -> Option<JobMatch> {
    let mut reasons: Vec<String> = Vec::new();
    let mut strengths: Vec<String> = Vec::new();
    let mut improvements: Vec<String> = Vec::new();

    // 1. Skills (30%)
    let (skill_score, skill_matches) = score_skills(profile, job);
    if skill_matches > 0 {
        reasons.push(format!(
            "{}/{} skills matched",
            skill_matches,
            profile.skills.len()
        ));
    }

    // 2. Experience (20%)
    let job_exp = ExperienceTier::parse(job.experience_level.as_deref());
    let exp_score = score_experience(profile.experience, job_exp);
    match exp_score {
        100 => reasons.push("Experience level meets requirements".to_string()),
        70 => improvements.push("Gain more experience".to_string()),
        _ => improvements.push("Build more experience in this field".to_string()),
    }

    // 3. Education (10%)
    let job_edu = EducationTier::parse(job.education_level.as_deref());
    let edu_score = score_education(profile.education, job_edu);

    // 4. Salary (15%)
    let salary_score = score_salary(
        profile.expected_salary,
        job.salary_min.unwrap_or(0),
        job.salary_max.unwrap_or(0),
    );
    match salary_score {
        100 => reasons.push("Salary perfectly matched".to_string()),
        80 => reasons.push("Salary negotiable".to_string()),
        _ => {}
    }

    // 5. Location & work mode (10%)
    let location_score = score_location(profile, job);
    match location_score {
        100 => reasons.push("Remote work matched".to_string()),
        90 => reasons.push("Location matched".to_string()),
        80 => reasons.push("Flexible work available".to_string()),
        _ => {}
    }

    // 6. Job type & culture (10%)
    let culture_score = score_culture(profile, job);

    let total = skill_score * 0.3
        + f64::from(exp_score) * 0.2
        + f64::from(edu_score) * 0.1
        + f64::from(salary_score) * 0.15
        + f64::from(location_score) * 0.1
        + f64::from(culture_score) * 0.1
        // 7. Career growth (5%) — flat credit, a deliberate constant bonus.
        + 75.0 * 0.05;

    let final_score = (total.round() as u32).min(MAX_SCORE);
    if final_score < RETENTION_FLOOR {
        return None;
    }

    let fit_analysis = FitAnalysis {
        skills: skill_score.round() as u32,
        experience: exp_score,
        education: edu_score,
        salary: salary_score,
        location: location_score,
        culture: culture_score,
    };

    if fit_analysis.skills >= 80 {
        strengths.push("Strong skills alignment".to_string());
    }
    if fit_analysis.experience >= 80 {
        strengths.push("Relevant experience".to_string());
    }
    if fit_analysis.salary >= 80 {
        strengths.push("Good salary fit".to_string());
    }
    if fit_analysis.location >= 80 {
        strengths.push("Location preference matched".to_string());
    }

    // The feedback lists are never empty.
    if strengths.is_empty() {
        strengths.push("Good overall profile match".to_string());
    }
    if improvements.is_empty() {
        improvements.push("Continue building experience".to_string());
    }
    if reasons.is_empty() {
        reasons.push("Profile matches job requirements".to_string());
    }

    reasons.truncate(MAX_REASONS);
    strengths.truncate(MAX_STRENGTHS);
    improvements.truncate(MAX_IMPROVEMENTS);

    Some(JobMatch {
        job_id: job.id.to_string(),
        match_score: final_score,
        reasons,
        strengths,
        improvements,
        fit_analysis,
        recommendation: Recommendation::from_score(final_score),
    })
}

/// Scores the whole candidate pool: first `CANDIDATE_LIMIT` jobs, retained
/// results sorted descending by score, truncated to `RESULT_LIMIT`.
pub fn score_corpus(profile: &MatchProfile, jobs: &[JobRow]) -> Vec<JobMatch> {
    let mut matches: Vec<JobMatch> = jobs
        .iter()
        .take(CANDIDATE_LIMIT)
        .filter_map(|job| score_job(profile, job))
        .collect();

    matches.sort_by(|a, b| b.match_score.cmp(&a.match_score));
    matches.truncate(RESULT_LIMIT);
    matches
}

/// Skills: fraction of the user's skills found among the job's declared
/// skills or anywhere in its title/description/tags text. A user with no
/// listed skills gets a neutral 50, not zero.
///
/// Returned unrounded: the weighted total consumes the exact fraction and
/// only the per-category breakdown rounds it, so totals stay comparable
/// with persisted runs.
fn score_skills(profile: &MatchProfile, job: &JobRow) -> (f64, usize) {
    if profile.skills.is_empty() {
        return (50.0, 0);
    }

    let job_skills: Vec<String> = job
        .required_skills
        .iter()
        .chain(job.preferred_skills.iter())
        .map(|s| s.to_lowercase())
        .collect();

    let job_text = format!(
        "{} {} {}",
        job.title,
        job.description.as_deref().unwrap_or(""),
        job.tags.join(" ")
    )
    .to_lowercase();

    let matched = profile
        .skills
        .iter()
        .filter(|skill| {
            job_skills.iter().any(|js| js == *skill) || job_text.contains(skill.as_str())
        })
        .count();

    let score = matched as f64 / profile.skills.len() as f64 * 100.0;
    (score, matched)
}

/// Experience: meeting or exceeding the bar is a full score; one tier short
/// is coachable; further short is a hard gap.
fn score_experience(user: ExperienceTier, job: ExperienceTier) -> u32 {
    if user.rank() >= job.rank() {
        100
    } else if user.rank() + 1 == job.rank() {
        70
    } else {
        40
    }
}

fn score_education(user: EducationTier, job: EducationTier) -> u32 {
    if user.rank() >= job.rank() {
        100
    } else {
        60
    }
}

/// Salary: 100 inside the posted band, 80 up to 20% above the max
/// (negotiable), 70 down to 20% below the min, 50 otherwise or when either
/// side left salary unspecified.
fn score_salary(expected: i64, job_min: i64, job_max: i64) -> u32 {
    if expected <= 0 || job_max <= 0 {
        return 50;
    }
    if expected >= job_min && expected <= job_max {
        100
    } else if expected > job_max && expected as f64 <= job_max as f64 * 1.2 {
        80
    } else if expected < job_min && expected as f64 >= job_min as f64 * 0.8 {
        70
    } else {
        50
    }
}

/// Location/work-mode, checked in priority order: mutual remote beats
/// everything, then a flexible job, then an exact location hit.
fn score_location(profile: &MatchProfile, job: &JobRow) -> u32 {
    let user_location = &profile.preferred_location;
    let job_location = job
        .location
        .as_deref()
        .unwrap_or("")
        .to_lowercase();
    let work_mode = job
        .work_mode
        .as_deref()
        .unwrap_or("on-site")
        .to_lowercase();

    if user_location.contains("remote") && work_mode.contains("remote") {
        100
    } else if work_mode.contains("remote") || work_mode.contains("hybrid") {
        80
    } else if !user_location.is_empty() && job_location.contains(user_location.as_str()) {
        90
    } else {
        50
    }
}

/// Job type: exact match 100, both full-time-ish 80, else 70.
fn score_culture(profile: &MatchProfile, job: &JobRow) -> u32 {
    let user_type = &profile.preferred_job_type;
    let job_type = job
        .job_type
        .as_deref()
        .unwrap_or("full-time")
        .to_lowercase();

    if *user_type == job_type {
        100
    } else if user_type.contains("full-time") && job_type.contains("full-time") {
        80
    } else {
        70
    }
}
