//! Database models for users.

use crate::types::UserId;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone)]
pub struct UserCreateDBRequest {
    pub username: String,
    /// Height in centimetres
    pub height: Option<Decimal>,
    /// Weight in kilograms
    pub weight: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct UserDBResponse {
    pub id: UserId,
    pub username: String,
    pub height: Option<Decimal>,
    pub weight: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
