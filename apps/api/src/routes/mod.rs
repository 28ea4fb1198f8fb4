pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::chatbot::handlers as chatbot;
use crate::matching::handlers as matching;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Matching API
        .route("/api/v1/match", post(matching::handle_match))
        .route(
            "/api/v1/match/user/:user_id/matches",
            get(matching::handle_user_matches),
        )
        .route("/api/v1/match/:match_id", get(matching::handle_get_match))
        // Chatbot API
        .route(
            "/api/v1/chatbot/chat/:user_email",
            get(chatbot::handle_get_chat).delete(chatbot::handle_clear_chat),
        )
        .route(
            "/api/v1/chatbot/chat/:user_email/message",
            post(chatbot::handle_send_message),
        )
        .route(
            "/api/v1/chatbot/user-status/:user_email",
            get(chatbot::handle_user_status),
        )
        .with_state(state)
}
