//! API models for the food catalogue.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::pagination::PageRequest;
use crate::db::models::diet_foods::DietFoodDBResponse;
use crate::types::FoodId;

/// Query parameters for browsing foods. Blank filters are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListDietFoodsQuery {
    #[serde(flatten)]
    pub page: PageRequest,
    /// Substring of the food name, case-insensitive
    pub name: Option<String>,
    /// Substring of the food type, case-insensitive
    pub food_type: Option<String>,
}

/// A food with its nutrient values per 100 g
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DietFoodResponse {
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

impl From<DietFoodDBResponse> for DietFoodResponse {
    fn from(db: DietFoodDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            calories: db.calories,
            protein: db.protein,
            fat: db.fat,
            carbohydrates: db.carbohydrates,
            water: db.water,
            food_type: db.food_type,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}
