use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use crate::auth::middleware::AuthUser;
use crate::error::{AppError, AppResult};
use crate::models::entry::{
    CreateEntryRequest, JournalEntry, SessionMode, SessionResolution, UpdateEntryRequest,
};
use crate::services::{resolver, stats};
use crate::AppState;

fn parse_date(year: i32, month: u32, day: u32) -> AppResult<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
        AppError::Validation(format!("{}-{}-{} is not a valid date", year, month, day))
    })
}

fn require_content(content: &str) -> AppResult<()> {
    if content.trim().is_empty() {
        return Err(AppError::Validation("Entry content must not be empty".into()));
    }
    Ok(())
}

pub async fn list_entries(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<Vec<JournalEntry>>> {
    let entries = sqlx::query_as::<_, JournalEntry>(
        "SELECT * FROM journal_entries WHERE user_id = $1 ORDER BY entry_date DESC",
    )
    .bind(auth_user.id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(entries))
}

pub async fn get_entries_by_date(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path((year, month, day)): Path<(i32, u32, u32)>,
) -> AppResult<Json<Vec<JournalEntry>>> {
    let date = parse_date(year, month, day)?;

    let entries = sqlx::query_as::<_, JournalEntry>(
        "SELECT * FROM journal_entries WHERE user_id = $1 AND entry_date = $2",
    )
    .bind(auth_user.id)
    .bind(date)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(entries))
}

pub async fn create_entry(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<CreateEntryRequest>,
) -> AppResult<Json<JournalEntry>> {
    require_content(&body.content)?;

    let today = Utc::now().date_naive();
    let entry_date = body.entry_date.unwrap_or(today);
    // Only a same-day entry is an active draft; backdated entries are
    // historical and never swept.
    let draft_day = (entry_date == today).then_some(today);

    let mut tx = state.db.begin().await?;

    let entry = sqlx::query_as::<_, JournalEntry>(
        r#"
        INSERT INTO journal_entries (id, user_id, title, content, entry_date, moods, draft_day)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(auth_user.id)
    .bind(&body.title)
    .bind(&body.content)
    .bind(entry_date)
    .bind(body.moods.as_deref().unwrap_or(&[]))
    .bind(draft_day)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
            AppError::Conflict("An entry already exists for this day".into())
        }
        _ => AppError::Database(e),
    })?;

    stats::refresh_user_stats(&mut tx, auth_user.id).await?;
    tx.commit().await?;

    Ok(Json(entry))
}

pub async fn update_entry(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(entry_id): Path<Uuid>,
    Json(body): Json<UpdateEntryRequest>,
) -> AppResult<Json<JournalEntry>> {
    if let Some(content) = &body.content {
        require_content(content)?;
    }

    let mut tx = state.db.begin().await?;

    let existing = sqlx::query_as::<_, JournalEntry>(
        "SELECT * FROM journal_entries WHERE id = $1 AND user_id = $2",
    )
    .bind(entry_id)
    .bind(auth_user.id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(AppError::NotFound("Entry not found".into()))?;

    let draft_day = if body.finalize == Some(true) {
        None
    } else {
        existing.draft_day
    };

    let entry = sqlx::query_as::<_, JournalEntry>(
        r#"
        UPDATE journal_entries SET
            title = COALESCE($3, title),
            content = COALESCE($4, content),
            moods = COALESCE($5, moods),
            ai_reflection = COALESCE($6, ai_reflection),
            is_favorite = COALESCE($7, is_favorite),
            draft_day = $8,
            updated_at = NOW()
        WHERE id = $1 AND user_id = $2
        RETURNING *
        "#,
    )
    .bind(entry_id)
    .bind(auth_user.id)
    .bind(&body.title)
    .bind(&body.content)
    .bind(&body.moods)
    .bind(&body.ai_reflection)
    .bind(body.is_favorite)
    .bind(draft_day)
    .fetch_one(&mut *tx)
    .await?;

    stats::refresh_user_stats(&mut tx, auth_user.id).await?;
    tx.commit().await?;

    Ok(Json(entry))
}

pub async fn delete_entry(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(entry_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let mut tx = state.db.begin().await?;

    let result = sqlx::query("DELETE FROM journal_entries WHERE id = $1 AND user_id = $2")
        .bind(entry_id)
        .bind(auth_user.id)
        .execute(&mut *tx)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Entry not found".into()));
    }

    stats::refresh_user_stats(&mut tx, auth_user.id).await?;
    tx.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Resolve what the editor should show for a given day, sweeping stale
/// drafts from earlier days when "today" is requested.
pub async fn resolve_session(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path((year, month, day)): Path<(i32, u32, u32)>,
) -> AppResult<Json<SessionResolution>> {
    let date = parse_date(year, month, day)?;
    let today = Utc::now().date_naive();

    // The sweep runs before the lookup so a deleted stale row can never be
    // returned. It is best-effort: on failure the stale row survives until
    // the next rollover check.
    if date == today {
        if let Err(e) = sweep_stale_drafts(&state, auth_user.id, today).await {
            tracing::warn!(user_id = %auth_user.id, error = %e, "Stale draft sweep failed");
        }
    }

    let existing = sqlx::query_as::<_, JournalEntry>(
        "SELECT * FROM journal_entries WHERE user_id = $1 AND entry_date = $2",
    )
    .bind(auth_user.id)
    .bind(date)
    .fetch_optional(&state.db)
    .await?;

    let decision = resolver::decide(date, today, existing.as_ref().map(|e| e.draft_day));

    let resolution = match decision {
        resolver::Decision::Load => SessionResolution {
            mode: SessionMode::Edit,
            date,
            entry: existing,
        },
        resolver::Decision::Blank => SessionResolution {
            mode: SessionMode::Create,
            date,
            entry: None,
        },
        // Only reachable when the sweep failed; the row is known stale, so
        // hide it rather than hand the editor a phantom entry.
        resolver::Decision::DiscardAndBlank => SessionResolution {
            mode: SessionMode::Create,
            date,
            entry: None,
        },
    };

    Ok(Json(resolution))
}

/// Delete every draft the user started on an earlier day, whatever day the
/// row is dated (a stale client can leave yesterday's draft tagged with
/// today's date). Refreshes stats in the same transaction when rows went
/// away.
async fn sweep_stale_drafts(
    state: &AppState,
    user_id: Uuid,
    today: NaiveDate,
) -> Result<u64, sqlx::Error> {
    let mut tx = state.db.begin().await?;

    let result = sqlx::query(
        "DELETE FROM journal_entries WHERE user_id = $1 AND draft_day IS NOT NULL AND draft_day < $2",
    )
    .bind(user_id)
    .bind(today)
    .execute(&mut *tx)
    .await?;

    let swept = result.rows_affected();
    if swept > 0 {
        stats::refresh_user_stats(&mut tx, user_id).await?;
        tracing::info!(user_id = %user_id, swept = swept, "Swept stale journal drafts");
    }
    tx.commit().await?;

    Ok(swept)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_dates_that_do_not_exist() {
        assert!(parse_date(2026, 2, 30).is_err());
        assert!(parse_date(2026, 13, 1).is_err());
        assert!(parse_date(2026, 2, 28).is_ok());
    }

    #[test]
    fn rejects_whitespace_only_content() {
        assert!(require_content("").is_err());
        assert!(require_content("   \n\t ").is_err());
        assert!(require_content("slept badly, but wrote anyway").is_ok());
    }
}
