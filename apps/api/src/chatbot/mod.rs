//! AI chatbot: usage metering & access gate, intent classification, the
//! deterministic job-search path, and the conversational responder.

pub mod access;
pub mod handlers;
pub mod intent;
pub mod jobsearch;
pub mod responder;
