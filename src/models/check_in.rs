use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A follow-up question surfaced by a counseling conversation, scheduled to
/// be asked again on a later day. Never expired automatically.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CheckIn {
    pub id: Uuid,
    pub user_id: Uuid,
    pub question: String,
    pub conversation_date: NaiveDate,
    pub scheduled_date: NaiveDate,
    pub priority: CheckInPriority,
    pub tags: Vec<String>,
    pub answered: bool,
    pub resolved: bool,
    pub answer: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::Type, PartialEq)]
#[sqlx(type_name = "check_in_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CheckInPriority {
    Low,
    Medium,
    High,
}

impl Default for CheckInPriority {
    fn default() -> Self {
        Self::Medium
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateCheckInRequest {
    pub question: String,
    pub conversation_date: Option<NaiveDate>,
    pub scheduled_date: NaiveDate,
    pub priority: Option<CheckInPriority>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct RespondCheckInRequest {
    pub answer: String,
}

#[derive(Debug, Deserialize)]
pub struct CheckInQuery {
    /// When true, only unanswered check-ins whose scheduled date has arrived.
    pub due: Option<bool>,
}
