use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: String,
    pub timezone: String,
    pub subscription_tier: SubscriptionTier,
    pub subscription_status: SubscriptionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::Type, PartialEq)]
#[sqlx(type_name = "subscription_tier", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionTier {
    Free,
    Plus,
    Pro,
}

impl Default for SubscriptionTier {
    fn default() -> Self {
        Self::Free
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::Type, PartialEq)]
#[sqlx(type_name = "subscription_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Trialing,
    PastDue,
    Canceled,
    Inactive,
}

impl Default for SubscriptionStatus {
    fn default() -> Self {
        Self::Inactive
    }
}

#[derive(Debug, Serialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub timezone: String,
    pub subscription_tier: SubscriptionTier,
    pub subscription_status: SubscriptionStatus,
    pub entitlements: UserEntitlements,
    pub created_at: DateTime<Utc>,
}

/// Feature limits derived from the subscription tier. `None` means unlimited.
#[derive(Debug, Serialize, Clone)]
pub struct UserEntitlements {
    pub max_active_goals: Option<i64>,
    pub ai_reflections_per_day: Option<i32>,
    pub challenges_enabled: bool,
    pub blueprint_export: bool,
}

impl UserEntitlements {
    pub fn for_tier(tier: &SubscriptionTier) -> Self {
        match tier {
            SubscriptionTier::Free => Self {
                max_active_goals: Some(5),
                ai_reflections_per_day: Some(2),
                challenges_enabled: true,
                blueprint_export: false,
            },
            SubscriptionTier::Plus => Self {
                max_active_goals: Some(25),
                ai_reflections_per_day: Some(10),
                challenges_enabled: true,
                blueprint_export: true,
            },
            SubscriptionTier::Pro => Self {
                max_active_goals: None,
                ai_reflections_per_day: None, // unlimited
                challenges_enabled: true,
                blueprint_export: true,
            },
        }
    }
}

impl From<User> for UserProfile {
    fn from(u: User) -> Self {
        let entitlements = UserEntitlements::for_tier(&u.subscription_tier);
        Self {
            id: u.id,
            email: u.email,
            name: u.name,
            timezone: u.timezone,
            subscription_tier: u.subscription_tier,
            subscription_status: u.subscription_status,
            entitlements,
            created_at: u.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[allow(dead_code)]
pub struct RefreshToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub revoked: bool,
    pub created_at: DateTime<Utc>,
}
