//! Database models for body measurements.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::types::{HealthDataId, UserId};

/// Database request for a measurement; `bmi` is computed before the insert
#[derive(Debug, Clone)]
pub struct HealthDataCreateDBRequest {
    pub user_id: UserId,
    pub heart_rate: Option<i32>,
    pub weight: Decimal,
    pub bmi: Decimal,
    pub measurement_date: DateTime<Utc>,
}

/// `weight` and `bmi` are either both set or both `None`
#[derive(Debug, Clone, Default)]
pub struct HealthDataUpdateDBRequest {
    pub heart_rate: Option<i32>,
    pub weight: Option<Decimal>,
    pub bmi: Option<Decimal>,
    pub measurement_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct HealthDataDBResponse {
    pub id: HealthDataId,
    pub user_id: UserId,
    pub heart_rate: Option<i32>,
    pub weight: Decimal,
    pub bmi: Decimal,
    pub measurement_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A measurement joined with its user's height
#[derive(Debug, Clone, FromRow)]
pub struct HealthDataRow {
    #[sqlx(flatten)]
    pub data: HealthDataDBResponse,
    pub height: Option<Decimal>,
}
