use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use uuid::Uuid;

use crate::auth::middleware::AuthUser;
use crate::error::{AppError, AppResult};
use crate::models::goal::{
    CreateGoalRequest, Goal, GoalActivity, GoalHorizon, GoalStatus, LogActivityRequest,
    UpdateGoalRequest,
};
use crate::models::user::{SubscriptionTier, UserEntitlements};
use crate::AppState;

pub async fn list_goals(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<Vec<Goal>>> {
    let goals = sqlx::query_as::<_, Goal>(
        "SELECT * FROM goals WHERE user_id = $1 ORDER BY created_at ASC",
    )
    .bind(auth_user.id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(goals))
}

pub async fn get_goal(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(goal_id): Path<Uuid>,
) -> AppResult<Json<Goal>> {
    let goal = sqlx::query_as::<_, Goal>("SELECT * FROM goals WHERE id = $1 AND user_id = $2")
        .bind(goal_id)
        .bind(auth_user.id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(AppError::NotFound("Goal not found".into()))?;

    Ok(Json(goal))
}

pub async fn create_goal(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<CreateGoalRequest>,
) -> AppResult<Json<Goal>> {
    if body.title.trim().is_empty() {
        return Err(AppError::Validation("Goal title is required".into()));
    }

    // Parent must exist and belong to the caller.
    if let Some(parent_id) = body.parent_id {
        sqlx::query_scalar::<_, Uuid>("SELECT id FROM goals WHERE id = $1 AND user_id = $2")
            .bind(parent_id)
            .bind(auth_user.id)
            .fetch_optional(&state.db)
            .await?
            .ok_or(AppError::NotFound("Parent goal not found".into()))?;
    }

    let tier = sqlx::query_scalar::<_, SubscriptionTier>(
        "SELECT subscription_tier FROM users WHERE id = $1",
    )
    .bind(auth_user.id)
    .fetch_one(&state.db)
    .await?;

    if let Some(limit) = UserEntitlements::for_tier(&tier).max_active_goals {
        let active = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM goals WHERE user_id = $1 AND status IN ('not_started', 'in_progress')",
        )
        .bind(auth_user.id)
        .fetch_one(&state.db)
        .await?;

        if active >= limit {
            return Err(AppError::Forbidden);
        }
    }

    let goal = sqlx::query_as::<_, Goal>(
        r#"
        INSERT INTO goals (id, user_id, parent_id, title, description, horizon)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(auth_user.id)
    .bind(body.parent_id)
    .bind(&body.title)
    .bind(&body.description)
    .bind(body.horizon.as_ref().unwrap_or(&GoalHorizon::Monthly))
    .fetch_one(&state.db)
    .await?;

    Ok(Json(goal))
}

pub async fn update_goal(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(goal_id): Path<Uuid>,
    Json(body): Json<UpdateGoalRequest>,
) -> AppResult<Json<Goal>> {
    let _existing = sqlx::query_as::<_, Goal>("SELECT * FROM goals WHERE id = $1 AND user_id = $2")
        .bind(goal_id)
        .bind(auth_user.id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(AppError::NotFound("Goal not found".into()))?;

    let goal = sqlx::query_as::<_, Goal>(
        r#"
        UPDATE goals SET
            title = COALESCE($3, title),
            description = COALESCE($4, description),
            parent_id = COALESCE($5, parent_id),
            horizon = COALESCE($6, horizon),
            status = COALESCE($7, status),
            updated_at = NOW()
        WHERE id = $1 AND user_id = $2
        RETURNING *
        "#,
    )
    .bind(goal_id)
    .bind(auth_user.id)
    .bind(&body.title)
    .bind(&body.description)
    .bind(body.parent_id)
    .bind(&body.horizon)
    .bind(&body.status)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(goal))
}

pub async fn delete_goal(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(goal_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let result = sqlx::query("DELETE FROM goals WHERE id = $1 AND user_id = $2")
        .bind(goal_id)
        .bind(auth_user.id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Goal not found".into()));
    }

    Ok(StatusCode::NO_CONTENT)
}

fn validate_activity(body: &LogActivityRequest) -> AppResult<()> {
    if body.minutes_spent <= 0 {
        return Err(AppError::Validation("minutes_spent must be positive".into()));
    }
    if !(0..=100).contains(&body.progress_increment) {
        return Err(AppError::Validation(
            "progress_increment must be between 0 and 100".into(),
        ));
    }
    Ok(())
}

/// Append an activity row and fold it into the parent goal in one
/// transaction: time is additive, progress is additive but clamped to 100
/// at the data layer.
pub async fn log_activity(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(goal_id): Path<Uuid>,
    Json(body): Json<LogActivityRequest>,
) -> AppResult<Json<GoalActivity>> {
    validate_activity(&body)?;

    let mut tx = state.db.begin().await?;

    let goal = sqlx::query_as::<_, Goal>(
        "SELECT * FROM goals WHERE id = $1 AND user_id = $2 FOR UPDATE",
    )
    .bind(goal_id)
    .bind(auth_user.id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(AppError::NotFound("Goal not found".into()))?;

    let activity_date = body.activity_date.unwrap_or_else(|| Utc::now().date_naive());

    let activity = sqlx::query_as::<_, GoalActivity>(
        r#"
        INSERT INTO goal_activities (id, goal_id, user_id, minutes_spent, progress_increment, description, activity_date)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(goal_id)
    .bind(auth_user.id)
    .bind(body.minutes_spent)
    .bind(body.progress_increment)
    .bind(&body.description)
    .bind(activity_date)
    .fetch_one(&mut *tx)
    .await?;

    let new_status = if goal.status == GoalStatus::NotStarted {
        GoalStatus::InProgress
    } else {
        goal.status
    };

    sqlx::query(
        r#"
        UPDATE goals SET
            time_spent = time_spent + $2,
            progress = LEAST(100, progress + $3),
            status = $4,
            updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(goal_id)
    .bind(body.minutes_spent)
    .bind(body.progress_increment)
    .bind(&new_status)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(Json(activity))
}

pub async fn list_activities(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(goal_id): Path<Uuid>,
) -> AppResult<Json<Vec<GoalActivity>>> {
    sqlx::query_scalar::<_, Uuid>("SELECT id FROM goals WHERE id = $1 AND user_id = $2")
        .bind(goal_id)
        .bind(auth_user.id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(AppError::NotFound("Goal not found".into()))?;

    let activities = sqlx::query_as::<_, GoalActivity>(
        "SELECT * FROM goal_activities WHERE goal_id = $1 ORDER BY created_at DESC",
    )
    .bind(goal_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(activities))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(minutes: i32, increment: i32) -> LogActivityRequest {
        LogActivityRequest {
            minutes_spent: minutes,
            progress_increment: increment,
            description: None,
            activity_date: None,
        }
    }

    #[test]
    fn rejects_zero_or_negative_minutes() {
        assert!(validate_activity(&request(0, 10)).is_err());
        assert!(validate_activity(&request(-5, 10)).is_err());
        assert!(validate_activity(&request(45, 10)).is_ok());
    }

    #[test]
    fn rejects_out_of_range_increment() {
        assert!(validate_activity(&request(45, -1)).is_err());
        assert!(validate_activity(&request(45, 101)).is_err());
        assert!(validate_activity(&request(45, 0)).is_ok());
        assert!(validate_activity(&request(45, 100)).is_ok());
    }
}
