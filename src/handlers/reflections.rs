use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::auth::middleware::AuthUser;
use crate::error::{AppError, AppResult};
use crate::models::entry::JournalEntry;
use crate::models::user::{SubscriptionTier, UserEntitlements};
use crate::services::ai;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct ReflectionResponse {
    pub entry: JournalEntry,
    pub source: String, // "anthropic" or "fallback"
}

/// Re-generate the AI reflection for an entry. Metered per day by tier;
/// over-cap and provider failures both degrade to a deterministic
/// placeholder rather than an error, so the editor is never blocked.
pub async fn regenerate_reflection(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(entry_id): Path<Uuid>,
) -> AppResult<Json<ReflectionResponse>> {
    let entry = sqlx::query_as::<_, JournalEntry>(
        "SELECT * FROM journal_entries WHERE id = $1 AND user_id = $2",
    )
    .bind(entry_id)
    .bind(auth_user.id)
    .fetch_optional(&state.db)
    .await?
    .ok_or(AppError::NotFound("Entry not found".into()))?;

    let tier = sqlx::query_scalar::<_, SubscriptionTier>(
        "SELECT subscription_tier FROM users WHERE id = $1",
    )
    .bind(auth_user.id)
    .fetch_one(&state.db)
    .await?;

    let within_quota = match UserEntitlements::for_tier(&tier).ai_reflections_per_day {
        Some(cap) => consume_ai_call(&state, auth_user.id, cap).await?,
        None => true,
    };

    let (text, source) = if !within_quota {
        tracing::info!(user_id = %auth_user.id, "AI reflection quota reached, using fallback");
        (ai::fallback_reflection(&entry.moods), "fallback")
    } else {
        match ai::generate_reflection(&state.config, &entry).await {
            Ok(text) => (text, "anthropic"),
            Err(e) => {
                tracing::warn!(error = %e, "AI provider unavailable, using fallback reflection");
                (ai::fallback_reflection(&entry.moods), "fallback")
            }
        }
    };

    let entry = sqlx::query_as::<_, JournalEntry>(
        r#"
        UPDATE journal_entries SET
            ai_reflection = $3,
            updated_at = NOW()
        WHERE id = $1 AND user_id = $2
        RETURNING *
        "#,
    )
    .bind(entry_id)
    .bind(auth_user.id)
    .bind(&text)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(ReflectionResponse {
        entry,
        source: source.into(),
    }))
}

/// Atomic check-and-increment against today's usage row. Returns false
/// once the cap is spent.
async fn consume_ai_call(state: &AppState, user_id: Uuid, cap: i32) -> AppResult<bool> {
    let today = Utc::now().date_naive();

    let consumed = sqlx::query_scalar::<_, i32>(
        r#"
        INSERT INTO chat_usage (user_id, usage_date, calls_used)
        VALUES ($1, $2, 1)
        ON CONFLICT (user_id, usage_date) DO UPDATE
            SET calls_used = chat_usage.calls_used + 1
            WHERE chat_usage.calls_used < $3
        RETURNING calls_used
        "#,
    )
    .bind(user_id)
    .bind(today)
    .bind(cap)
    .fetch_optional(&state.db)
    .await?;

    Ok(consumed.is_some())
}
