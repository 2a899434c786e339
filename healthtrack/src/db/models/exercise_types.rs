//! Database models for exercise types.

use crate::types::ExerciseTypeId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone)]
pub struct ExerciseTypeCreateDBRequest {
    pub name: String,
}

#[derive(Debug, Clone, Default)]
pub struct ExerciseTypeUpdateDBRequest {
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ExerciseTypeDBResponse {
    pub id: ExerciseTypeId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
