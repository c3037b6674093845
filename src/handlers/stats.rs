use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::{Datelike, Utc};
use std::collections::HashMap;

use crate::auth::middleware::AuthUser;
use crate::error::AppResult;
use crate::models::stats::{JournalStatsRow, StatsPeriod, StatsQuery, StatsResponse};
use crate::services::stats;
use crate::AppState;

pub async fn get_stats(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<StatsQuery>,
) -> AppResult<Json<StatsResponse>> {
    let row = match fetch_stats_row(&state, auth_user.id).await? {
        Some(row) => row,
        None => {
            // First read before any entry mutation: materialize lazily.
            let mut tx = state.db.begin().await?;
            stats::refresh_user_stats(&mut tx, auth_user.id).await?;
            tx.commit().await?;
            fetch_stats_row(&state, auth_user.id)
                .await?
                .ok_or_else(|| anyhow::anyhow!("journal_stats row missing after refresh"))?
        }
    };

    let entries_count = match query.period {
        Some(StatsPeriod::Month) => {
            let today = Utc::now().date_naive();
            let month_start = today.with_day(1).unwrap_or(today);
            sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM journal_entries WHERE user_id = $1 AND entry_date BETWEEN $2 AND $3",
            )
            .bind(auth_user.id)
            .bind(month_start)
            .bind(today)
            .fetch_one(&state.db)
            .await?
        }
        _ => row.entries_count,
    };

    let top_moods: HashMap<String, i64> =
        serde_json::from_value(row.top_moods).unwrap_or_default();

    Ok(Json(StatsResponse {
        entries_count,
        current_streak: row.current_streak,
        longest_streak: row.longest_streak,
        top_moods,
    }))
}

async fn fetch_stats_row(
    state: &AppState,
    user_id: uuid::Uuid,
) -> Result<Option<JournalStatsRow>, sqlx::Error> {
    sqlx::query_as::<_, JournalStatsRow>("SELECT * FROM journal_stats WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(&state.db)
        .await
}
