//! API request/response models for health goals.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::exercise_types::ExerciseTypeSummary;
use super::pagination::PageRequest;
use crate::db::models::health_goals::HealthGoalDBResponse;
use crate::types::{ExerciseTypeId, HealthGoalId, UserId};

/// Request body for setting a goal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthGoalCreate {
    pub user_id: UserId,
    pub target_plan: String,
    pub target_date: DateTime<Utc>,
    #[serde(default)]
    pub is_finished: bool,
    #[serde(default)]
    pub is_abandoned: bool,
    #[serde(default)]
    pub exercise_type_ids: Vec<ExerciseTypeId>,
}

/// Request body for updating a goal. `exercise_type_ids` replaces the current types.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthGoalUpdate {
    pub id: HealthGoalId,
    pub target_plan: Option<String>,
    pub target_date: Option<DateTime<Utc>>,
    pub is_finished: Option<bool>,
    pub is_abandoned: Option<bool>,
    #[serde(default)]
    pub exercise_type_ids: Vec<ExerciseTypeId>,
}

fn ascending() -> bool {
    true
}

/// Query parameters for listing goals
#[derive(Debug, Clone, Deserialize)]
pub struct ListHealthGoalsQuery {
    #[serde(flatten)]
    pub page: PageRequest,
    pub user_id: Option<UserId>,
    pub is_finished: Option<bool>,
    /// Inclusive lower bound on `target_date`
    pub start: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `target_date`
    pub end: Option<DateTime<Utc>>,
    #[serde(default = "ascending")]
    pub is_asc: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthGoalDetail {
    pub id: HealthGoalId,
    pub user_id: UserId,
    pub target_plan: String,
    pub target_date: DateTime<Utc>,
    pub is_finished: bool,
    pub is_abandoned: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub exercise_types: Vec<ExerciseTypeSummary>,
}

impl HealthGoalDetail {
    pub fn new(goal: HealthGoalDBResponse, exercise_types: Vec<ExerciseTypeSummary>) -> Self {
        Self {
            id: goal.id,
            user_id: goal.user_id,
            target_plan: goal.target_plan,
            target_date: goal.target_date,
            is_finished: goal.is_finished,
            is_abandoned: goal.is_abandoned,
            created_at: goal.created_at,
            updated_at: goal.updated_at,
            exercise_types,
        }
    }
}
