use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Goal {
    pub id: Uuid,
    pub user_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    pub horizon: GoalHorizon,
    pub status: GoalStatus,
    /// 0–100, clamped at the data layer on every activity log.
    pub progress: i32,
    /// Cumulative minutes across all logged activities.
    pub time_spent: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::Type, PartialEq)]
#[sqlx(type_name = "goal_horizon", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum GoalHorizon {
    Life,
    Yearly,
    Monthly,
    Weekly,
    Daily,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::Type, PartialEq)]
#[sqlx(type_name = "goal_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    NotStarted,
    InProgress,
    Completed,
    Abandoned,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GoalActivity {
    pub id: Uuid,
    pub goal_id: Uuid,
    pub user_id: Uuid,
    pub minutes_spent: i32,
    pub progress_increment: i32,
    pub description: Option<String>,
    pub activity_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateGoalRequest {
    pub title: String,
    pub description: Option<String>,
    pub parent_id: Option<Uuid>,
    pub horizon: Option<GoalHorizon>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateGoalRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub parent_id: Option<Uuid>,
    pub horizon: Option<GoalHorizon>,
    pub status: Option<GoalStatus>,
}

#[derive(Debug, Deserialize)]
pub struct LogActivityRequest {
    pub minutes_spent: i32,
    pub progress_increment: i32,
    pub description: Option<String>,
    pub activity_date: Option<NaiveDate>,
}
