use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use uuid::Uuid;

use crate::auth::middleware::AuthUser;
use crate::error::{AppError, AppResult};
use crate::models::check_in::{
    CheckIn, CheckInPriority, CheckInQuery, CreateCheckInRequest, RespondCheckInRequest,
};
use crate::AppState;

pub async fn create_check_in(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<CreateCheckInRequest>,
) -> AppResult<Json<CheckIn>> {
    if body.question.trim().is_empty() {
        return Err(AppError::Validation("Check-in question is required".into()));
    }

    let conversation_date = body
        .conversation_date
        .unwrap_or_else(|| Utc::now().date_naive());

    if body.scheduled_date < conversation_date {
        return Err(AppError::Validation(
            "scheduled_date must not precede the conversation date".into(),
        ));
    }

    let check_in = sqlx::query_as::<_, CheckIn>(
        r#"
        INSERT INTO check_ins (id, user_id, question, conversation_date, scheduled_date, priority, tags)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(auth_user.id)
    .bind(&body.question)
    .bind(conversation_date)
    .bind(body.scheduled_date)
    .bind(body.priority.as_ref().unwrap_or(&CheckInPriority::Medium))
    .bind(body.tags.as_deref().unwrap_or(&[]))
    .fetch_one(&state.db)
    .await?;

    Ok(Json(check_in))
}

pub async fn list_check_ins(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<CheckInQuery>,
) -> AppResult<Json<Vec<CheckIn>>> {
    let check_ins = if query.due.unwrap_or(false) {
        sqlx::query_as::<_, CheckIn>(
            r#"
            SELECT * FROM check_ins
            WHERE user_id = $1 AND NOT answered AND scheduled_date <= $2
            ORDER BY priority DESC, scheduled_date ASC
            "#,
        )
        .bind(auth_user.id)
        .bind(Utc::now().date_naive())
        .fetch_all(&state.db)
        .await?
    } else {
        sqlx::query_as::<_, CheckIn>(
            "SELECT * FROM check_ins WHERE user_id = $1 ORDER BY scheduled_date DESC",
        )
        .bind(auth_user.id)
        .fetch_all(&state.db)
        .await?
    };

    Ok(Json(check_ins))
}

pub async fn respond_check_in(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(check_in_id): Path<Uuid>,
    Json(body): Json<RespondCheckInRequest>,
) -> AppResult<Json<CheckIn>> {
    if body.answer.trim().is_empty() {
        return Err(AppError::Validation("Answer must not be empty".into()));
    }

    let check_in = sqlx::query_as::<_, CheckIn>(
        r#"
        UPDATE check_ins SET
            answer = $3,
            answered = TRUE,
            updated_at = NOW()
        WHERE id = $1 AND user_id = $2
        RETURNING *
        "#,
    )
    .bind(check_in_id)
    .bind(auth_user.id)
    .bind(&body.answer)
    .fetch_optional(&state.db)
    .await?
    .ok_or(AppError::NotFound("Check-in not found".into()))?;

    Ok(Json(check_in))
}

pub async fn resolve_check_in(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(check_in_id): Path<Uuid>,
) -> AppResult<Json<CheckIn>> {
    let check_in = sqlx::query_as::<_, CheckIn>(
        r#"
        UPDATE check_ins SET
            resolved = TRUE,
            updated_at = NOW()
        WHERE id = $1 AND user_id = $2
        RETURNING *
        "#,
    )
    .bind(check_in_id)
    .bind(auth_user.id)
    .fetch_optional(&state.db)
    .await?
    .ok_or(AppError::NotFound("Check-in not found".into()))?;

    Ok(Json(check_in))
}

pub async fn delete_check_in(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(check_in_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let result = sqlx::query("DELETE FROM check_ins WHERE id = $1 AND user_id = $2")
        .bind(check_in_id)
        .bind(auth_user.id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Check-in not found".into()));
    }

    Ok(StatusCode::NO_CONTENT)
}
