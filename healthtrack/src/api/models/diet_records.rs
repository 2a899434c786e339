//! API request/response models for diet records.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::pagination::PageRequest;
use crate::db::models::diet_records::DietRecordDBResponse;
use crate::types::{DietRecordId, FoodId, UserId};

/// One food eaten in a meal, with the consumed quantity in grams
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FoodPortion {
    pub food_id: FoodId,
    pub quantity: Decimal,
}

/// Request body for recording a meal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DietRecordCreate {
    pub user_id: UserId,
    /// e.g. "breakfast", at most 10 characters
    pub meal_type: String,
    pub meal_time: DateTime<Utc>,
    pub meal_note: Option<String>,
    pub meal_place: Option<String>,
    #[serde(default)]
    pub foods: Vec<FoodPortion>,
}

/// Request body for updating a meal. Absent fields are left unchanged; `foods` always replaces
/// the meal's current foods, so an empty list clears them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DietRecordUpdate {
    pub id: DietRecordId,
    pub meal_type: Option<String>,
    pub meal_time: Option<DateTime<Utc>>,
    pub meal_note: Option<String>,
    pub meal_place: Option<String>,
    #[serde(default)]
    pub foods: Vec<FoodPortion>,
}

fn ascending() -> bool {
    true
}

/// Query parameters for listing diet records
#[derive(Debug, Clone, Deserialize)]
pub struct ListDietRecordsQuery {
    #[serde(flatten)]
    pub page: PageRequest,
    pub user_id: Option<UserId>,
    pub meal_type: Option<String>,
    /// Inclusive lower bound on `meal_time`
    pub start: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `meal_time`
    pub end: Option<DateTime<Utc>>,
    #[serde(default = "ascending")]
    pub is_asc: bool,
}

/// Query parameters for a nutrition summary
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NutritionIntakeQuery {
    pub user_id: Option<UserId>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

/// A food of a listed meal, with its per-100 g nutrients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodPortionDetail {
    pub food_id: FoodId,
    pub name: String,
    pub quantity: Decimal,
    pub calories: Decimal,
    pub protein: Option<Decimal>,
    pub fat: Option<Decimal>,
    pub carbohydrates: Option<Decimal>,
    pub water: Option<Decimal>,
    pub food_type: Option<String>,
}

/// A meal with every food eaten in it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DietRecordDetail {
    pub id: DietRecordId,
    pub user_id: UserId,
    pub meal_type: String,
    pub meal_time: DateTime<Utc>,
    pub meal_note: Option<String>,
    pub meal_place: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub foods: Vec<FoodPortionDetail>,
}

impl DietRecordDetail {
    pub fn new(record: DietRecordDBResponse, foods: Vec<FoodPortionDetail>) -> Self {
        Self {
            id: record.id,
            user_id: record.user_id,
            meal_type: record.meal_type,
            meal_time: record.meal_time,
            meal_note: record.meal_note,
            meal_place: record.meal_place,
            created_at: record.created_at,
            updated_at: record.updated_at,
            foods,
        }
    }
}
