//! API request/response models for exercise records.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::exercise_types::ExerciseTypeSummary;
use super::pagination::PageRequest;
use crate::db::models::exercise_records::ExerciseRecordDBResponse;
use crate::types::{ExerciseRecordId, ExerciseTypeId, UserId};

/// Request body for logging a workout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExerciseRecordCreate {
    pub user_id: UserId,
    /// Minutes
    pub duration: i32,
    /// Kilometres
    pub distance: Option<Decimal>,
    pub calories_burned: Option<Decimal>,
    /// Average beats per minute
    pub heart_rate: Option<i32>,
    pub exercise_note: Option<String>,
    pub exercise_date: DateTime<Utc>,
    #[serde(default)]
    pub exercise_type_ids: Vec<ExerciseTypeId>,
}

/// Request body for updating a workout. `exercise_type_ids` replaces the current types.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExerciseRecordUpdate {
    pub id: ExerciseRecordId,
    pub duration: Option<i32>,
    pub distance: Option<Decimal>,
    pub calories_burned: Option<Decimal>,
    pub heart_rate: Option<i32>,
    pub exercise_note: Option<String>,
    pub exercise_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub exercise_type_ids: Vec<ExerciseTypeId>,
}

fn ascending() -> bool {
    true
}

/// Query parameters for listing exercise records
#[derive(Debug, Clone, Deserialize)]
pub struct ListExerciseRecordsQuery {
    #[serde(flatten)]
    pub page: PageRequest,
    pub user_id: Option<UserId>,
    /// Inclusive lower bound on `exercise_date`
    pub start: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `exercise_date`
    pub end: Option<DateTime<Utc>>,
    #[serde(default = "ascending")]
    pub is_asc: bool,
}

/// A workout with its exercise types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseRecordDetail {
    pub id: ExerciseRecordId,
    pub user_id: UserId,
    pub duration: i32,
    pub distance: Option<Decimal>,
    pub calories_burned: Option<Decimal>,
    pub heart_rate: Option<i32>,
    pub exercise_note: Option<String>,
    pub exercise_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub exercise_types: Vec<ExerciseTypeSummary>,
}

impl ExerciseRecordDetail {
    pub fn new(record: ExerciseRecordDBResponse, exercise_types: Vec<ExerciseTypeSummary>) -> Self {
        Self {
            id: record.id,
            user_id: record.user_id,
            duration: record.duration,
            distance: record.distance,
            calories_burned: record.calories_burned,
            heart_rate: record.heart_rate,
            exercise_note: record.exercise_note,
            exercise_date: record.exercise_date,
            created_at: record.created_at,
            updated_at: record.updated_at,
            exercise_types,
        }
    }
}
