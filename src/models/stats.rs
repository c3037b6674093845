use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::HashMap;
use uuid::Uuid;

/// Materialized per-user aggregate over journal entries. Refreshed inside
/// the same transaction as every entry mutation; never drifts because it is
/// always recomputed from source rows rather than counter-bumped.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JournalStatsRow {
    pub user_id: Uuid,
    pub entries_count: i64,
    pub current_streak: i32,
    pub longest_streak: i32,
    pub top_moods: serde_json::Value,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub entries_count: i64,
    pub current_streak: i32,
    pub longest_streak: i32,
    pub top_moods: HashMap<String, i64>,
}

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    /// `all` (default) or `month`; `month` windows `entries_count` to the
    /// current calendar month. Streaks always use full history.
    pub period: Option<StatsPeriod>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum StatsPeriod {
    All,
    Month,
}
