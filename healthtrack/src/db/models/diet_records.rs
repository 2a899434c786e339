//! Database models for diet records and their joined food rows.

use bon::Builder;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::api::models::diet_records::{DietRecordCreate, DietRecordUpdate, FoodPortionDetail};
use crate::services::aggregation::{Nutrient, WeightedRecord};
use crate::types::{DietRecordId, FoodId, UserId};

/// Database request for creating a diet record
#[derive(Debug, Clone, Builder)]
pub struct DietRecordCreateDBRequest {
    pub user_id: UserId,
    #[builder(into)]
    pub meal_type: String,
    pub meal_time: DateTime<Utc>,
    pub meal_note: Option<String>,
    pub meal_place: Option<String>,
}

impl DietRecordCreateDBRequest {
    pub fn from_api_create(create: &DietRecordCreate) -> Self {
        Self::builder()
            .user_id(create.user_id)
            .meal_type(create.meal_type.clone())
            .meal_time(create.meal_time)
            .maybe_meal_note(create.meal_note.clone())
            .maybe_meal_place(create.meal_place.clone())
            .build()
    }
}

/// Database request for updating a diet record; `None` leaves the column unchanged
#[derive(Debug, Clone, Default)]
pub struct DietRecordUpdateDBRequest {
    pub meal_type: Option<String>,
    pub meal_time: Option<DateTime<Utc>>,
    pub meal_note: Option<String>,
    pub meal_place: Option<String>,
}

impl From<&DietRecordUpdate> for DietRecordUpdateDBRequest {
    fn from(update: &DietRecordUpdate) -> Self {
        Self {
            meal_type: update.meal_type.clone(),
            meal_time: update.meal_time,
            meal_note: update.meal_note.clone(),
            meal_place: update.meal_place.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct DietRecordDBResponse {
    pub id: DietRecordId,
    pub user_id: UserId,
    pub meal_type: String,
    pub meal_time: DateTime<Utc>,
    pub meal_note: Option<String>,
    pub meal_place: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One row of `diet_records ⟕ diet_records_foods ⟕ diet_foods`. The food columns are `None`
/// for a record without foods.
#[derive(Debug, Clone, FromRow)]
pub struct DietRecordFoodRow {
    #[sqlx(flatten)]
    pub record: DietRecordDBResponse,
    pub food_id: Option<FoodId>,
    pub food_name: Option<String>,
    pub quantity: Option<Decimal>,
    pub calories: Option<Decimal>,
    pub protein: Option<Decimal>,
    pub fat: Option<Decimal>,
    pub carbohydrates: Option<Decimal>,
    pub water: Option<Decimal>,
    pub food_type: Option<String>,
}

impl DietRecordFoodRow {
    /// Split into the record and, when the row carries one, its food
    pub fn split(self) -> (DietRecordDBResponse, Option<FoodPortionDetail>) {
        let food = match (self.food_id, self.food_name, self.quantity, self.calories) {
            (Some(food_id), Some(name), Some(quantity), Some(calories)) => Some(FoodPortionDetail {
                food_id,
                name,
                quantity,
                calories,
                protein: self.protein,
                fat: self.fat,
                carbohydrates: self.carbohydrates,
                water: self.water,
                food_type: self.food_type,
            }),
            _ => None,
        };
        (self.record, food)
    }
}

/// One eaten food of a record, as fed into the nutrition summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct DietNutrientRow {
    pub diet_record_id: DietRecordId,
    pub meal_type: String,
    pub meal_time: DateTime<Utc>,
    pub food_id: FoodId,
    pub food_name: String,
    pub quantity: Decimal,
    pub calories: Decimal,
    pub protein: Option<Decimal>,
    pub fat: Option<Decimal>,
    pub carbohydrates: Option<Decimal>,
    pub water: Option<Decimal>,
}

impl WeightedRecord<Nutrient> for DietNutrientRow {
    fn value(&self, nutrient: Nutrient) -> Option<Decimal> {
        match nutrient {
            Nutrient::Calories => Some(self.calories),
            Nutrient::Protein => self.protein,
            Nutrient::Fat => self.fat,
            Nutrient::Carbohydrates => self.carbohydrates,
            Nutrient::Water => self.water,
        }
    }

    fn quantity(&self) -> Option<Decimal> {
        Some(self.quantity)
    }
}
