//! Database models for foods.

use crate::types::FoodId;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Database request for creating a new food. Nutrient values are per 100 g.
#[derive(Debug, Clone, bon::Builder)]
pub struct DietFoodCreateDBRequest {
    #[builder(into)]
    pub name: String,
    pub calories: Decimal,
    pub protein: Option<Decimal>,
    pub fat: Option<Decimal>,
    pub carbohydrates: Option<Decimal>,
    pub water: Option<Decimal>,
    #[builder(into)]
    pub food_type: Option<String>,
}

/// Database request for updating a food; `None` leaves the column unchanged.
#[derive(Debug, Clone, Default)]
pub struct DietFoodUpdateDBRequest {
    pub name: Option<String>,
    pub calories: Option<Decimal>,
    pub protein: Option<Decimal>,
    pub fat: Option<Decimal>,
    pub carbohydrates: Option<Decimal>,
    pub water: Option<Decimal>,
    pub food_type: Option<String>,
}

/// Database response for a food
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct DietFoodDBResponse {
    pub id: FoodId,
    pub name: String,
    pub calories: Decimal,
    pub protein: Option<Decimal>,
    pub fat: Option<Decimal>,
    pub carbohydrates: Option<Decimal>,
    pub water: Option<Decimal>,
    pub food_type: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
