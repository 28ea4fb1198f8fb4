//! AI job-matching pipeline: profile normalization, deterministic
//! compatibility scoring, the remote provider chain, and the orchestrator
//! that ties them together and persists match runs.

pub mod handlers;
pub mod orchestrator;
pub mod profile;
pub mod prompts;
pub mod providers;
pub mod scoring;
