//! Usage Metering & Access Gate.
//!
//! Decides, before any reply is generated, whether a chat turn is permitted
//! and what it costs. Tier is derived fresh from current counts on every
//! request — never cached.
//!
//! The free-message counter is the persisted `chat_usage.free_messages_used`
//! value: monotonic, survives restarts and transcript clears. A free slot is
//! claimed with a single conditional increment so two concurrent turns cannot
//! both ride the same slot — this is a monetization-integrity boundary.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::info;

use crate::errors::AppError;
use crate::models::user::{get_user_by_email, UserRow};

/// First N user messages are free.
pub const FREE_MESSAGES: i64 = 2;
/// Minimum balance required to chat on credits once the free allowance is
/// spent.
pub const MIN_CREDITS_REQUIRED: i64 = 10;
/// One credit covers ten characters of generated reply.
pub const CREDITS_PER_CHARACTER: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessTier {
    Free,
    Premium,
    Credits,
    Blocked,
}

/// The gate's verdict for one turn. Serialized as the `userAccess` object on
/// every chat response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessDecision {
    pub allowed: bool,
    pub tier: AccessTier,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_free: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credits: Option<i64>,
    pub message_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<i64>,
}

impl AccessDecision {
    /// Terminal denial for an unresolvable user. Not retried.
    pub fn unknown_user() -> Self {
        AccessDecision {
            allowed: false,
            tier: AccessTier::Blocked,
            remaining_free: None,
            credits: None,
            message_count: 0,
            reason: Some("User not found".to_string()),
            required: None,
        }
    }
}

/// Pure decision core, evaluated against the prior free-message count:
/// free allowance, then premium flag, then credit balance, else blocked.
pub fn decide_access(user: &UserRow, used: i64) -> AccessDecision {
    if used < FREE_MESSAGES {
        return AccessDecision {
            allowed: true,
            tier: AccessTier::Free,
            remaining_free: Some(FREE_MESSAGES - used),
            credits: None,
            message_count: used,
            reason: None,
            required: None,
        };
    }

    if user.is_premium {
        return AccessDecision {
            allowed: true,
            tier: AccessTier::Premium,
            remaining_free: None,
            credits: Some(user.ai_credits),
            message_count: used,
            reason: None,
            required: None,
        };
    }

    if user.ai_credits >= MIN_CREDITS_REQUIRED {
        return AccessDecision {
            allowed: true,
            tier: AccessTier::Credits,
            remaining_free: None,
            credits: Some(user.ai_credits),
            message_count: used,
            reason: None,
            required: None,
        };
    }

    AccessDecision {
        allowed: false,
        tier: AccessTier::Blocked,
        remaining_free: None,
        credits: Some(user.ai_credits),
        message_count: used,
        reason: Some("Insufficient credits".to_string()),
        required: Some(MIN_CREDITS_REQUIRED),
    }
}

/// Read-only evaluation for status displays. Does not consume anything.
pub async fn evaluate(pool: &PgPool, user_email: &str) -> Result<AccessDecision, AppError> {
    let Some(user) = get_user_by_email(pool, user_email).await? else {
        return Ok(AccessDecision::unknown_user());
    };
    let used = fetch_used(pool, user_email).await?;
    Ok(decide_access(&user, used))
}

/// Gates one incoming turn. Free turns consume a slot atomically; if the
/// claim loses a race for the last slot, the decision is re-derived from the
/// post-race counts (which can no longer be free-tier).
pub async fn begin_turn(pool: &PgPool, user: &UserRow) -> Result<AccessDecision, AppError> {
    ensure_usage_row(pool, &user.email).await?;

    let used = fetch_used(pool, &user.email).await?;
    let decision = decide_access(user, used);

    if decision.tier != AccessTier::Free {
        return Ok(decision);
    }

    if claim_free_slot(pool, &user.email).await? {
        info!(
            "User {} claimed free message {}/{}",
            user.email,
            used + 1,
            FREE_MESSAGES
        );
        return Ok(decision);
    }

    // Lost the race for the last free slot; the counter is exhausted now.
    let used = fetch_used(pool, &user.email).await?;
    Ok(decide_access(user, used))
}

/// Deducts credits for a generated reply in one atomic update and stamps the
/// last-chat timestamp. Returns the amount deducted.
pub async fn deduct_for_reply(
    pool: &PgPool,
    user_email: &str,
    reply: &str,
) -> Result<i64, AppError> {
    let credits_used = credits_for_reply(reply);
    sqlx::query(
        r#"
        UPDATE users
        SET ai_credits = ai_credits - $1, last_ai_chat = now()
        WHERE email = $2
        "#,
    )
    .bind(credits_used)
    .bind(user_email)
    .execute(pool)
    .await?;

    info!("Deducted {credits_used} credits from {user_email}");
    Ok(credits_used)
}

/// ceil(chars × CREDITS_PER_CHARACTER): partial credits always round up.
/// Billed per character, not per byte — emoji-heavy replies are the norm
/// here and must not cost four times their length.
pub fn credits_for_reply(reply: &str) -> i64 {
    (reply.chars().count() as f64 * CREDITS_PER_CHARACTER).ceil() as i64
}

async fn fetch_used(pool: &PgPool, user_email: &str) -> Result<i64, AppError> {
    let used: Option<i64> =
        sqlx::query_scalar("SELECT free_messages_used FROM chat_usage WHERE user_email = $1")
            .bind(user_email)
            .fetch_optional(pool)
            .await?;
    Ok(used.unwrap_or(0))
}

async fn ensure_usage_row(pool: &PgPool, user_email: &str) -> Result<(), AppError> {
    sqlx::query(
        "INSERT INTO chat_usage (user_email) VALUES ($1) ON CONFLICT (user_email) DO NOTHING",
    )
    .bind(user_email)
    .execute(pool)
    .await?;
    Ok(())
}

/// Conditional increment: succeeds only while free messages remain. The WHERE
/// clause makes check-then-increment a single atomic step.
async fn claim_free_slot(pool: &PgPool, user_email: &str) -> Result<bool, AppError> {
    let claimed: Option<i64> = sqlx::query_scalar(
        r#"
        UPDATE chat_usage
        SET free_messages_used = free_messages_used + 1, updated_at = now()
        WHERE user_email = $1 AND free_messages_used < $2
        RETURNING free_messages_used
        "#,
    )
    .bind(user_email)
    .bind(FREE_MESSAGES)
    .fetch_optional(pool)
    .await?;
    Ok(claimed.is_some())
}
