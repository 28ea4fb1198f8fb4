//! Axum route handlers for the Chatbot API.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::chatbot::access::{begin_turn, deduct_for_reply, evaluate, AccessDecision, AccessTier};
use crate::chatbot::jobsearch::JobCard;
use crate::chatbot::responder::{generate_reply, RESET_MESSAGE, WELCOME_MESSAGE};
use crate::errors::AppError;
use crate::models::chat::{
    append_message, clear_messages, list_messages, recent_messages, ChatMessageRow,
    ROLE_ASSISTANT, ROLE_USER,
};
use crate::models::user::get_user_by_email;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptResponse {
    pub user_email: String,
    pub messages: Vec<ChatMessageRow>,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageResponse {
    pub user_message: ChatMessageRow,
    pub assistant_message: ChatMessageRow,
    pub user_access: AccessDecision,
    pub jobs: Vec<JobCard>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStatusResponse {
    pub user_access: AccessDecision,
    pub user: Option<UserStatusUser>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStatusUser {
    pub email: String,
    pub is_premium: bool,
    pub ai_credits: i64,
    pub current_plan: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ClearChatResponse {
    pub message: &'static str,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/chatbot/chat/:user_email
///
/// Returns the transcript, seeding the greeting on first contact.
pub async fn handle_get_chat(
    State(state): State<AppState>,
    Path(user_email): Path<String>,
) -> Result<Json<TranscriptResponse>, AppError> {
    let mut messages = list_messages(&state.db, &user_email).await?;
    if messages.is_empty() {
        let greeting =
            append_message(&state.db, &user_email, ROLE_ASSISTANT, WELCOME_MESSAGE).await?;
        messages.push(greeting);
    }

    Ok(Json(TranscriptResponse {
        user_email,
        messages,
    }))
}

/// POST /api/v1/chatbot/chat/:user_email/message
///
/// One chat turn: gate, respond, persist both messages, meter credits.
pub async fn handle_send_message(
    State(state): State<AppState>,
    Path(user_email): Path<String>,
    Json(request): Json<SendMessageRequest>,
) -> Result<Json<SendMessageResponse>, AppError> {
    let message = request
        .message
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .ok_or_else(|| AppError::Validation("Message is required".to_string()))?;

    let history = recent_messages(&state.db, &user_email, 20).await?;

    // Gate BEFORE persisting the user message: the decision reflects prior
    // turns only. An unknown user still gets a friendly denial reply.
    let access = match get_user_by_email(&state.db, &user_email).await? {
        Some(user) => begin_turn(&state.db, &user).await?,
        None => AccessDecision::unknown_user(),
    };

    let reply = generate_reply(
        &state.db,
        state.completer.as_ref(),
        &access,
        message,
        &history,
    )
    .await?;

    let user_message = append_message(&state.db, &user_email, ROLE_USER, message).await?;
    let assistant_message =
        append_message(&state.db, &user_email, ROLE_ASSISTANT, &reply.content).await?;

    // Allowed non-free turns pay per character of generated reply. Free
    // turns and denials never deduct.
    if !reply.blocked && access.tier != AccessTier::Free {
        deduct_for_reply(&state.db, &user_email, &reply.content).await?;
    }

    // The client shows post-turn state, so re-derive it.
    let user_access = evaluate(&state.db, &user_email).await?;

    Ok(Json(SendMessageResponse {
        user_message,
        assistant_message,
        user_access,
        jobs: reply.jobs,
    }))
}

/// GET /api/v1/chatbot/user-status/:user_email
///
/// Read-only access evaluation plus account summary.
pub async fn handle_user_status(
    State(state): State<AppState>,
    Path(user_email): Path<String>,
) -> Result<Json<UserStatusResponse>, AppError> {
    let user_access = evaluate(&state.db, &user_email).await?;
    let user = get_user_by_email(&state.db, &user_email)
        .await?
        .map(|u| UserStatusUser {
            email: u.email,
            is_premium: u.is_premium,
            ai_credits: u.ai_credits,
            current_plan: u.current_plan,
            role: u.role,
        });

    Ok(Json(UserStatusResponse { user_access, user }))
}

/// DELETE /api/v1/chatbot/chat/:user_email
///
/// Clears the displayed transcript and re-seeds the greeting. The usage
/// counter is untouched: clearing grants no fresh free messages.
pub async fn handle_clear_chat(
    State(state): State<AppState>,
    Path(user_email): Path<String>,
) -> Result<Json<ClearChatResponse>, AppError> {
    clear_messages(&state.db, &user_email).await?;
    append_message(&state.db, &user_email, ROLE_ASSISTANT, RESET_MESSAGE).await?;

    Ok(Json(ClearChatResponse {
        message: "Chat cleared successfully",
    }))
}
