//! Database models for health profiles.

use crate::api::models::health_profiles::{HealthProfileCreate, HealthProfileUpdate};
use crate::types::{HealthProfileId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone)]
pub struct HealthProfileCreateDBRequest {
    pub user_id: UserId,
    pub medical_history: Option<String>,
    pub allergy_history: Option<String>,
    pub exercise_habits: Option<String>,
    pub health_goals: Option<String>,
}

impl From<&HealthProfileCreate> for HealthProfileCreateDBRequest {
    fn from(create: &HealthProfileCreate) -> Self {
        Self {
            user_id: create.user_id,
            medical_history: create.medical_history.clone(),
            allergy_history: create.allergy_history.clone(),
            exercise_habits: create.exercise_habits.clone(),
            health_goals: create.health_goals.clone(),
        }
    }
}

/// Field-wise update; `None` leaves the column unchanged
#[derive(Debug, Clone, Default)]
pub struct HealthProfileUpdateDBRequest {
    pub medical_history: Option<String>,
    pub allergy_history: Option<String>,
    pub exercise_habits: Option<String>,
    pub health_goals: Option<String>,
}

impl From<&HealthProfileUpdate> for HealthProfileUpdateDBRequest {
    fn from(update: &HealthProfileUpdate) -> Self {
        Self {
            medical_history: update.medical_history.clone(),
            allergy_history: update.allergy_history.clone(),
            exercise_habits: update.exercise_habits.clone(),
            health_goals: update.health_goals.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct HealthProfileDBResponse {
    pub id: HealthProfileId,
    pub user_id: UserId,
    pub medical_history: Option<String>,
    pub allergy_history: Option<String>,
    pub exercise_habits: Option<String>,
    pub health_goals: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
