//! Intent classification for incoming chat messages.
//!
//! A pure keyword classifier with first-match-wins priority:
//! JobSearch > Hiring > Premium > Greeting > General. The order is part of
//! the contract — "I want to hire" classifies as JobSearch because the
//! job-search vocabulary is checked first.

/// What the user is trying to do with this message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    JobSearch,
    Hiring,
    Premium,
    Greeting,
    General,
}

const JOB_SEARCH_VERBS: [&str; 7] = [
    "find",
    "search",
    "looking for",
    "need",
    "want",
    "show me",
    "get me",
];

const JOB_SEARCH_TOPICS: [&str; 5] = ["react", "developer", "frontend", "backend", "tell me about"];

const HIRING_TERMS: [&str; 3] = ["hire", "recruit", "candidate"];

const PREMIUM_TERMS: [&str; 4] = ["premium", "upgrade", "subscription", "plan"];

const GREETINGS: [&str; 6] = ["hi", "hello", "hey", "sup", "what's up", "howdy"];

pub fn classify_intent(message: &str) -> Intent {
    let lower = message.trim().to_lowercase();

    let is_job_search = JOB_SEARCH_VERBS.iter().any(|v| lower.contains(v))
        || (lower.contains("job") && JOB_SEARCH_TOPICS.iter().any(|t| lower.contains(t)))
        || lower.contains("career opportunities")
        || lower.contains("work opportunities");
    if is_job_search {
        return Intent::JobSearch;
    }

    if HIRING_TERMS.iter().any(|t| lower.contains(t)) {
        return Intent::Hiring;
    }

    if PREMIUM_TERMS.iter().any(|t| lower.contains(t)) {
        return Intent::Premium;
    }

    // Greetings must match the whole message, not a substring — "hi" inside
    // "hiring" must not classify here.
    if GREETINGS.contains(&lower.as_str()) {
        return Intent::Greeting;
    }

    Intent::General
}
