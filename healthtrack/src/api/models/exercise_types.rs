//! API models for exercise types.

use serde::{Deserialize, Serialize};

use super::pagination::PageRequest;
use crate::db::models::exercise_types::ExerciseTypeDBResponse;
use crate::types::ExerciseTypeId;

/// An exercise type as shown nested under a record or goal, and in the type catalogue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseTypeSummary {
    pub id: ExerciseTypeId,
    pub name: String,
}

impl From<ExerciseTypeDBResponse> for ExerciseTypeSummary {
    fn from(db: ExerciseTypeDBResponse) -> Self {
        Self { id: db.id, name: db.name }
    }
}

/// Query parameters for browsing exercise types
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListExerciseTypesQuery {
    #[serde(flatten)]
    pub page: PageRequest,
    /// Substring of the type name, case-insensitive
    pub name: Option<String>,
}
