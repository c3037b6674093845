use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::auth::middleware::AuthUser;
use crate::error::{AppError, AppResult};
use crate::models::user::{SubscriptionTier, UserEntitlements};
use crate::AppState;

#[derive(Debug, Serialize, FromRow)]
pub struct BlueprintDownload {
    pub id: Uuid,
    pub user_id: Uuid,
    pub blueprint_kind: String,
    pub created_at: DateTime<Utc>,
}

/// Record that the client exported a blueprint PDF. Generation happens
/// client-side; the server only keeps the audit trail and gates it by tier.
pub async fn record_download(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(kind): Path<String>,
) -> AppResult<Json<BlueprintDownload>> {
    if kind.trim().is_empty() {
        return Err(AppError::Validation("Blueprint kind is required".into()));
    }

    let tier = sqlx::query_scalar::<_, SubscriptionTier>(
        "SELECT subscription_tier FROM users WHERE id = $1",
    )
    .bind(auth_user.id)
    .fetch_one(&state.db)
    .await?;

    if !UserEntitlements::for_tier(&tier).blueprint_export {
        return Err(AppError::Forbidden);
    }

    let download = sqlx::query_as::<_, BlueprintDownload>(
        r#"
        INSERT INTO blueprint_downloads (id, user_id, blueprint_kind)
        VALUES ($1, $2, $3)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(auth_user.id)
    .bind(&kind)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(download))
}
