//! API request/response models for health profiles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::models::health_profiles::HealthProfileDBResponse;
use crate::types::{HealthProfileId, UserId};

/// Request body for opening a user's health profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthProfileCreate {
    pub user_id: UserId,
    pub medical_history: Option<String>,
    pub allergy_history: Option<String>,
    pub exercise_habits: Option<String>,
    pub health_goals: Option<String>,
}

/// Request body for amending the profile of `user_id`; absent fields keep their value
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthProfileUpdate {
    pub user_id: UserId,
    pub medical_history: Option<String>,
    pub allergy_history: Option<String>,
    pub exercise_habits: Option<String>,
    pub health_goals: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthProfileResponse {
    pub id: HealthProfileId,
    pub user_id: UserId,
    pub medical_history: Option<String>,
    pub allergy_history: Option<String>,
    pub exercise_habits: Option<String>,
    pub health_goals: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<HealthProfileDBResponse> for HealthProfileResponse {
    fn from(db: HealthProfileDBResponse) -> Self {
        Self {
            id: db.id,
            user_id: db.user_id,
            medical_history: db.medical_history,
            allergy_history: db.allergy_history,
            exercise_habits: db.exercise_habits,
            health_goals: db.health_goals,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}
