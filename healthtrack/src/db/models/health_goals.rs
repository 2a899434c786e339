//! Database models for health goals.

use bon::Builder;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::api::models::exercise_types::ExerciseTypeSummary;
use crate::api::models::health_goals::{HealthGoalCreate, HealthGoalUpdate};
use crate::types::{ExerciseTypeId, HealthGoalId, UserId};

#[derive(Debug, Clone, Builder)]
pub struct HealthGoalCreateDBRequest {
    pub user_id: UserId,
    #[builder(into)]
    pub target_plan: String,
    pub target_date: DateTime<Utc>,
    #[builder(default)]
    pub is_finished: bool,
    #[builder(default)]
    pub is_abandoned: bool,
}

impl HealthGoalCreateDBRequest {
    pub fn from_api_create(create: &HealthGoalCreate) -> Self {
        Self::builder()
            .user_id(create.user_id)
            .target_plan(create.target_plan.trim())
            .target_date(create.target_date)
            .is_finished(create.is_finished)
            .is_abandoned(create.is_abandoned)
            .build()
    }
}

#[derive(Debug, Clone, Default)]
pub struct HealthGoalUpdateDBRequest {
    pub target_plan: Option<String>,
    pub target_date: Option<DateTime<Utc>>,
    pub is_finished: Option<bool>,
    pub is_abandoned: Option<bool>,
}

impl From<&HealthGoalUpdate> for HealthGoalUpdateDBRequest {
    fn from(update: &HealthGoalUpdate) -> Self {
        Self {
            target_plan: update.target_plan.as_deref().map(|plan| plan.trim().to_string()),
            target_date: update.target_date,
            is_finished: update.is_finished,
            is_abandoned: update.is_abandoned,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct HealthGoalDBResponse {
    pub id: HealthGoalId,
    pub user_id: UserId,
    pub target_plan: String,
    pub target_date: DateTime<Utc>,
    pub is_finished: bool,
    pub is_abandoned: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One row of `health_goals ⟕ health_goals_exercise_types ⟕ exercise_types`
#[derive(Debug, Clone, FromRow)]
pub struct HealthGoalTypeRow {
    #[sqlx(flatten)]
    pub goal: HealthGoalDBResponse,
    pub exercise_type_id: Option<ExerciseTypeId>,
    pub exercise_type_name: Option<String>,
}

impl HealthGoalTypeRow {
    pub fn split(self) -> (HealthGoalDBResponse, Option<ExerciseTypeSummary>) {
        let exercise_type = self
            .exercise_type_id
            .zip(self.exercise_type_name)
            .map(|(id, name)| ExerciseTypeSummary { id, name });
        (self.goal, exercise_type)
    }
}
