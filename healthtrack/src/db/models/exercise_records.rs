//! Database models for exercise records.

use bon::Builder;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::api::models::exercise_records::{ExerciseRecordCreate, ExerciseRecordUpdate};
use crate::api::models::exercise_types::ExerciseTypeSummary;
use crate::types::{ExerciseRecordId, ExerciseTypeId, UserId};

#[derive(Debug, Clone, Builder)]
pub struct ExerciseRecordCreateDBRequest {
    pub user_id: UserId,
    pub duration: i32,
    pub distance: Option<Decimal>,
    pub calories_burned: Option<Decimal>,
    pub heart_rate: Option<i32>,
    pub exercise_note: Option<String>,
    pub exercise_date: DateTime<Utc>,
}

impl ExerciseRecordCreateDBRequest {
    pub fn from_api_create(create: &ExerciseRecordCreate) -> Self {
        Self::builder()
            .user_id(create.user_id)
            .duration(create.duration)
            .maybe_distance(create.distance)
            .maybe_calories_burned(create.calories_burned)
            .maybe_heart_rate(create.heart_rate)
            .maybe_exercise_note(create.exercise_note.clone())
            .exercise_date(create.exercise_date)
            .build()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExerciseRecordUpdateDBRequest {
    pub duration: Option<i32>,
    pub distance: Option<Decimal>,
    pub calories_burned: Option<Decimal>,
    pub heart_rate: Option<i32>,
    pub exercise_note: Option<String>,
    pub exercise_date: Option<DateTime<Utc>>,
}

impl From<&ExerciseRecordUpdate> for ExerciseRecordUpdateDBRequest {
    fn from(update: &ExerciseRecordUpdate) -> Self {
        Self {
            duration: update.duration,
            distance: update.distance,
            calories_burned: update.calories_burned,
            heart_rate: update.heart_rate,
            exercise_note: update.exercise_note.clone(),
            exercise_date: update.exercise_date,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ExerciseRecordDBResponse {
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
}

/// One row of `exercise_records ⟕ exercise_records_types ⟕ exercise_types`
#[derive(Debug, Clone, FromRow)]
pub struct ExerciseRecordTypeRow {
    #[sqlx(flatten)]
    pub record: ExerciseRecordDBResponse,
    pub exercise_type_id: Option<ExerciseTypeId>,
    pub exercise_type_name: Option<String>,
}

impl ExerciseRecordTypeRow {
    pub fn split(self) -> (ExerciseRecordDBResponse, Option<ExerciseTypeSummary>) {
        let exercise_type = self
            .exercise_type_id
            .zip(self.exercise_type_name)
            .map(|(id, name)| ExerciseTypeSummary { id, name });
        (self.record, exercise_type)
    }
}
