mod chatbot;
mod config;
mod db;
mod errors;
mod llm_client;
mod matching;
mod models;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::LlmClient;
use crate::matching::providers::{GroqMatchProvider, MatchProvider, PROVIDER_MODELS};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting CareerCrafter API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;

    // Initialize LLM client and the matching provider chain
    let llm = LlmClient::new(config.groq_api_key.clone());
    let providers: Vec<Arc<dyn MatchProvider>> = if llm.has_key() {
        PROVIDER_MODELS
            .iter()
            .map(|&model| {
                Arc::new(GroqMatchProvider::new(llm.clone(), model)) as Arc<dyn MatchProvider>
            })
            .collect()
    } else {
        warn!("GROQ_API_KEY not set — match runs will use basic fallback scoring only");
        Vec::new()
    };
    info!("Matching provider chain: {} providers", providers.len());

    // Build app state
    let state = AppState {
        db,
        config: config.clone(),
        providers,
        completer: Arc::new(llm),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
