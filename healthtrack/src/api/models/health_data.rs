//! API request/response models for body measurements.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::pagination::PageRequest;
use crate::db::models::health_data::HealthDataDBResponse;
use crate::types::{HealthDataId, UserId};

/// Request body for recording a measurement. BMI is derived from the user's height.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthDataCreate {
    pub user_id: UserId,
    pub heart_rate: Option<i32>,
    /// Kilograms
    pub weight: Decimal,
    pub measurement_date: DateTime<Utc>,
}

/// Request body for correcting a measurement. A new weight recomputes the BMI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthDataUpdate {
    pub id: HealthDataId,
    pub heart_rate: Option<i32>,
    pub weight: Option<Decimal>,
    pub measurement_date: Option<DateTime<Utc>>,
}

fn ascending() -> bool {
    true
}

/// Query parameters for listing measurements and for their trend
#[derive(Debug, Clone, Deserialize)]
pub struct ListHealthDataQuery {
    #[serde(flatten)]
    pub page: PageRequest,
    pub user_id: Option<UserId>,
    /// Inclusive lower bound on `measurement_date`
    pub start: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `measurement_date`
    pub end: Option<DateTime<Utc>>,
    #[serde(default = "ascending")]
    pub is_asc: bool,
}

/// A measurement together with the height its BMI was derived from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthDataDetail {
    pub id: HealthDataId,
    pub user_id: UserId,
    pub heart_rate: Option<i32>,
    pub weight: Decimal,
    pub bmi: Decimal,
    /// Current height of the user in centimetres
    pub height: Option<Decimal>,
    pub measurement_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl HealthDataDetail {
    pub fn new(data: HealthDataDBResponse, height: Option<Decimal>) -> Self {
        Self {
            id: data.id,
            user_id: data.user_id,
            heart_rate: data.heart_rate,
            weight: data.weight,
            bmi: data.bmi,
            height,
            measurement_date: data.measurement_date,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }
}

/// Parallel series over one page of measurements, index `i` of every series belonging to the
/// same measurement
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthDataTrend {
    pub measurement_dates: Vec<DateTime<Utc>>,
    pub heart_rates: Vec<Option<i32>>,
    pub weights: Vec<Decimal>,
    pub bmis: Vec<Decimal>,
}

impl FromIterator<HealthDataDetail> for HealthDataTrend {
    fn from_iter<I: IntoIterator<Item = HealthDataDetail>>(iter: I) -> Self {
        let mut trend = Self::default();
        for detail in iter {
            trend.measurement_dates.push(detail.measurement_date);
            trend.heart_rates.push(detail.heart_rate);
            trend.weights.push(detail.weight);
            trend.bmis.push(detail.bmi);
        }
        trend
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn detail(day: u32, heart_rate: Option<i32>, weight: i64, bmi: i64) -> HealthDataDetail {
        let date = Utc.with_ymd_and_hms(2025, 3, day, 7, 0, 0).unwrap();
        HealthDataDetail {
            id: HealthDataId(day as i64),
            user_id: UserId(1),
            heart_rate,
            weight: Decimal::new(weight, 1),
            bmi: Decimal::new(bmi, 2),
            height: Some(Decimal::new(170, 0)),
            measurement_date: date,
            created_at: date,
            updated_at: date,
        }
    }

    #[test]
    fn trend_series_stay_aligned() {
        let trend: HealthDataTrend = vec![detail(1, Some(62), 700, 2422), detail(2, None, 695, 2405)].into_iter().collect();

        assert_eq!(trend.measurement_dates.len(), 2);
        assert_eq!(trend.heart_rates, vec![Some(62), None]);
        assert_eq!(trend.weights, vec![Decimal::new(700, 1), Decimal::new(695, 1)]);
        assert_eq!(trend.bmis, vec![Decimal::new(2422, 2), Decimal::new(2405, 2)]);
    }
}
