use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One journal entry. At most one row exists per (user, entry_date); the
/// unique index in the schema enforces what the session resolver assumes.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JournalEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: Option<String>,
    pub content: String,
    pub entry_date: NaiveDate,
    pub moods: Vec<String>,
    pub ai_reflection: Option<String>,
    pub is_favorite: bool,
    /// Server day on which this row was last the active draft. `None` once
    /// the user has explicitly saved it as final.
    pub draft_day: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateEntryRequest {
    pub content: String,
    pub title: Option<String>,
    pub moods: Option<Vec<String>>,
    pub entry_date: Option<NaiveDate>,
}

/// Partial update: absent fields are left untouched.
#[derive(Debug, Deserialize)]
pub struct UpdateEntryRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub moods: Option<Vec<String>>,
    pub ai_reflection: Option<String>,
    pub is_favorite: Option<bool>,
    /// `true` marks the entry as explicitly saved, clearing the draft flag
    /// so the next day's rollover sweep leaves it alone.
    pub finalize: Option<bool>,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum SessionMode {
    /// An entry exists for the requested day; the editor loads it.
    Edit,
    /// No entry yet; the editor starts blank and creates on save.
    Create,
}

#[derive(Debug, Serialize)]
pub struct SessionResolution {
    pub mode: SessionMode,
    pub date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry: Option<JournalEntry>,
}
