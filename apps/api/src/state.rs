use std::sync::Arc;

use sqlx::PgPool;

use crate::chatbot::responder::ChatCompleter;
use crate::config::Config;
use crate::matching::providers::MatchProvider;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    /// Remote matching providers in priority order. Empty when no API key is
    /// configured — every match run then uses the deterministic fallback.
    pub providers: Vec<Arc<dyn MatchProvider>>,
    /// Conversational reply generator. Behind a trait so the access gate's
    /// "blocked turns make zero remote calls" guarantee is testable.
    pub completer: Arc<dyn ChatCompleter>,
}
