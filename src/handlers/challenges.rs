use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::Utc;
use uuid::Uuid;

use crate::auth::middleware::AuthUser;
use crate::error::{AppError, AppResult};
use crate::models::challenge::{Challenge, ChallengeProgress, UserBadge, UserChallenge};
use crate::AppState;

pub async fn list_challenges(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<Challenge>>> {
    let challenges = sqlx::query_as::<_, Challenge>(
        "SELECT * FROM challenges ORDER BY category ASC, title ASC",
    )
    .fetch_all(&state.db)
    .await?;

    Ok(Json(challenges))
}

pub async fn join_challenge(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(challenge_id): Path<Uuid>,
) -> AppResult<Json<UserChallenge>> {
    sqlx::query_scalar::<_, Uuid>("SELECT id FROM challenges WHERE id = $1")
        .bind(challenge_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(AppError::NotFound("Challenge not found".into()))?;

    let user_challenge = sqlx::query_as::<_, UserChallenge>(
        r#"
        INSERT INTO user_challenges (id, user_id, challenge_id)
        VALUES ($1, $2, $3)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(auth_user.id)
    .bind(challenge_id)
    .fetch_one(&state.db)
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
            AppError::Conflict("Challenge already joined".into())
        }
        _ => AppError::Database(e),
    })?;

    Ok(Json(user_challenge))
}

/// Record one day of progress. Completing the final day marks the
/// challenge done and awards its badge in the same transaction.
pub async fn record_progress(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(challenge_id): Path<Uuid>,
) -> AppResult<Json<ChallengeProgress>> {
    let mut tx = state.db.begin().await?;

    let challenge = sqlx::query_as::<_, Challenge>("SELECT * FROM challenges WHERE id = $1")
        .bind(challenge_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::NotFound("Challenge not found".into()))?;

    let existing = sqlx::query_as::<_, UserChallenge>(
        "SELECT * FROM user_challenges WHERE user_id = $1 AND challenge_id = $2 FOR UPDATE",
    )
    .bind(auth_user.id)
    .bind(challenge_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(AppError::NotFound("Challenge not joined".into()))?;

    if existing.completed_at.is_some() {
        return Err(AppError::Conflict("Challenge already completed".into()));
    }

    let new_progress = (existing.progress_days + 1).min(challenge.duration_days);
    let completed = new_progress >= challenge.duration_days;
    let completed_at = completed.then(Utc::now);

    let user_challenge = sqlx::query_as::<_, UserChallenge>(
        r#"
        UPDATE user_challenges SET
            progress_days = $2,
            completed_at = $3
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(existing.id)
    .bind(new_progress)
    .bind(completed_at)
    .fetch_one(&mut *tx)
    .await?;

    if completed {
        // Idempotent on the badge: a re-earned badge is kept, not duplicated.
        sqlx::query(
            r#"
            INSERT INTO user_badges (id, user_id, badge_name, challenge_id)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, badge_name) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(auth_user.id)
        .bind(&challenge.badge_name)
        .bind(challenge_id)
        .execute(&mut *tx)
        .await?;

        tracing::info!(
            user_id = %auth_user.id,
            challenge_id = %challenge_id,
            badge = %challenge.badge_name,
            "Challenge completed"
        );
    }

    tx.commit().await?;

    Ok(Json(ChallengeProgress {
        user_challenge,
        duration_days: challenge.duration_days,
        completed,
    }))
}

pub async fn list_my_challenges(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<Vec<UserChallenge>>> {
    let challenges = sqlx::query_as::<_, UserChallenge>(
        "SELECT * FROM user_challenges WHERE user_id = $1 ORDER BY started_at DESC",
    )
    .bind(auth_user.id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(challenges))
}

pub async fn list_badges(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<Vec<UserBadge>>> {
    let badges = sqlx::query_as::<_, UserBadge>(
        "SELECT * FROM user_badges WHERE user_id = $1 ORDER BY awarded_at DESC",
    )
    .bind(auth_user.id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(badges))
}
