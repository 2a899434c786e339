//! Body measurements with BMI derived from the owning user's height.

use std::collections::HashMap;

use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use tracing::{info, instrument};

use crate::api::models::health_data::{HealthDataCreate, HealthDataDetail, HealthDataTrend, HealthDataUpdate, ListHealthDataQuery};
use crate::api::models::pagination::PageResponse;
use crate::config::PaginationConfig;
use crate::db::{
    handlers::{
        health_data::{HealthData, HealthDataFilter},
        users::Users,
    },
    models::health_data::{HealthDataCreateDBRequest, HealthDataUpdateDBRequest},
};
use crate::errors::{Error, Result};
use crate::services::{
    batch::{check_time_range, check_unique_ids, ensure_not_empty, join_ids, or_not_found},
    body_metrics,
    pagination::{DetailSource, PaginatedAggregateQuery},
};
use crate::types::{HealthDataId, UserId};

fn check_measurement(heart_rate: Option<i32>, weight: Option<Decimal>) -> Result<()> {
    match heart_rate {
        Some(heart_rate) if heart_rate < 0 => {
            return Err(Error::BadRequest {
                message: format!("heart_rate must not be negative, got {heart_rate}"),
            });
        }
        _ => {}
    }
    match weight {
        Some(weight) if weight <= Decimal::ZERO => Err(Error::InvalidBodyMeasurement {
            message: format!("weight must be positive, got {weight} kg"),
        }),
        Some(weight) if weight > body_metrics::max_stored_measurement() => Err(Error::InvalidBodyMeasurement {
            message: format!("weight must be at most {} kg, got {weight} kg", body_metrics::max_stored_measurement()),
        }),
        _ => Ok(()),
    }
}

/// Height of the user in centimetres; a missing or non-positive height cannot yield a BMI.
async fn height_of(conn: &mut PgConnection, user_id: UserId) -> Result<Decimal> {
    let user = Users::new(conn).get_by_id(user_id).await?.ok_or_else(|| Error::NotFound {
        resource: "User".to_string(),
        id: user_id.to_string(),
    })?;

    match user.height {
        Some(height) if height > Decimal::ZERO => Ok(height),
        _ => Err(Error::UserHeightMissing {
            user_id: user_id.to_string(),
        }),
    }
}

/// Looks each user's height up once per batch
#[derive(Default)]
struct Heights(HashMap<UserId, Decimal>);

impl Heights {
    async fn get(&mut self, conn: &mut PgConnection, user_id: UserId) -> Result<Decimal> {
        if let Some(height) = self.0.get(&user_id) {
            return Ok(*height);
        }
        let height = height_of(conn, user_id).await?;
        self.0.insert(user_id, height);
        Ok(height)
    }
}

pub struct HealthDataService {
    db: PgPool,
    pagination: PaginationConfig,
}

impl HealthDataService {
    pub fn new(db: PgPool, pagination: PaginationConfig) -> Self {
        Self { db, pagination }
    }

    /// Store measurements, computing each BMI from the owner's current height.
    #[instrument(skip_all, fields(count = requests.len()), err)]
    pub async fn create_batch(&self, requests: Vec<HealthDataCreate>) -> Result<Vec<HealthDataId>> {
        ensure_not_empty(&requests, "health data record")?;
        for request in &requests {
            check_measurement(request.heart_rate, Some(request.weight))?;
        }

        let mut tx = self.db.begin().await.map_err(|e| Error::Database(e.into()))?;

        let mut heights = Heights::default();
        let mut ids = Vec::with_capacity(requests.len());
        for request in &requests {
            let height = heights.get(&mut tx, request.user_id).await?;
            let db_request = HealthDataCreateDBRequest {
                user_id: request.user_id,
                heart_rate: request.heart_rate,
                weight: request.weight,
                bmi: body_metrics::storable_bmi(height, request.weight)?,
                measurement_date: request.measurement_date,
            };
            ids.push(HealthData::new(&mut tx).create(&db_request).await?.id);
        }

        tx.commit().await.map_err(|e| Error::Database(e.into()))?;

        info!(records = ids.len(), "Created health data");
        Ok(ids)
    }

    /// Apply corrections; a changed weight recomputes the BMI with the owner's current height.
    #[instrument(skip_all, fields(count = updates.len()), err)]
    pub async fn update_batch(&self, updates: Vec<HealthDataUpdate>) -> Result<()> {
        ensure_not_empty(&updates, "health data record")?;
        check_unique_ids(updates.iter().map(|update| update.id), "health data record")?;
        for update in &updates {
            check_measurement(update.heart_rate, update.weight)?;
        }

        let mut tx = self.db.begin().await.map_err(|e| Error::Database(e.into()))?;

        let mut heights = Heights::default();
        for update in &updates {
            let bmi = match update.weight {
                Some(weight) => {
                    let existing = HealthData::new(&mut tx).get_by_id(update.id).await?.ok_or_else(|| Error::NotFound {
                        resource: "Health data".to_string(),
                        id: update.id.to_string(),
                    })?;
                    let height = heights.get(&mut tx, existing.user_id).await?;
                    Some(body_metrics::storable_bmi(height, weight)?)
                }
                None => None,
            };

            let db_request = HealthDataUpdateDBRequest {
                heart_rate: update.heart_rate,
                weight: update.weight,
                bmi,
                measurement_date: update.measurement_date,
            };
            HealthData::new(&mut tx)
                .update(update.id, &db_request)
                .await
                .map_err(or_not_found("Health data", update.id))?;
        }

        tx.commit().await.map_err(|e| Error::Database(e.into()))?;

        info!(records = updates.len(), "Updated health data");
        Ok(())
    }

    #[instrument(skip_all, fields(count = ids.len()), err)]
    pub async fn delete_batch(&self, ids: Vec<HealthDataId>) -> Result<u64> {
        ensure_not_empty(&ids, "health data id")?;

        let mut tx = self.db.begin().await.map_err(|e| Error::Database(e.into()))?;
        let deleted = HealthData::new(&mut tx).delete_bulk(&ids).await?;
        if deleted == 0 {
            return Err(Error::NotFound {
                resource: "Health data".to_string(),
                id: join_ids(&ids),
            });
        }
        tx.commit().await.map_err(|e| Error::Database(e.into()))?;

        info!(deleted, "Deleted health data");
        Ok(deleted)
    }

    #[instrument(skip_all, fields(user_id = ?query.user_id), err)]
    pub async fn list_page(&self, query: ListHealthDataQuery) -> Result<PageResponse<HealthDataDetail>> {
        check_time_range(query.start, query.end)?;

        let filter = Self::filter(&query);
        let mut conn = self.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
        PaginatedAggregateQuery::new(HealthData::new(&mut conn), self.pagination)
            .list(&filter, &query.page)
            .await
    }

    /// Dates, heart rates, weights and BMIs of one page of measurements, oldest first unless
    /// `is_asc` is false. An empty page is [`Error::NotFound`].
    #[instrument(skip_all, fields(user_id = ?query.user_id), err)]
    pub async fn trend(&self, query: ListHealthDataQuery) -> Result<HealthDataTrend> {
        check_time_range(query.start, query.end)?;
        let page = query.page.resolve(&self.pagination)?;

        let filter = Self::filter(&query);
        let mut conn = self.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
        let rows = HealthData::new(&mut conn).fetch_window(&filter, page.offset(), page.limit()).await?;

        if rows.is_empty() {
            return Err(Error::NotFound {
                resource: "Health data".to_string(),
                id: query.user_id.map(|id| format!("for user {id}")).unwrap_or_else(|| "in range".to_string()),
            });
        }

        Ok(HealthData::assemble(rows).into_iter().collect())
    }

    fn filter(query: &ListHealthDataQuery) -> HealthDataFilter {
        HealthDataFilter::builder()
            .maybe_user_id(query.user_id)
            .maybe_start(query.start)
            .maybe_end(query.end)
            .ascending(query.is_asc)
            .build()
    }
}


#[cfg(all(test, feature = "postgres-tests"))]
mod postgres_tests {
    use super::*;
    use crate::api::models::pagination::PageRequest;
    use crate::test_utils::{create_test_user, create_user_with_height};
    use chrono::{DateTime, TimeZone, Utc};

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, day, 7, 0, 0).unwrap()
    }

    fn measurement(user_id: UserId, day: u32, weight: i64) -> HealthDataCreate {
        HealthDataCreate {
            user_id,
            heart_rate: Some(60 + day as i32),
            weight: Decimal::new(weight, 0),
            measurement_date: at(day),
        }
    }

    fn query(user_id: UserId, current: i64, size: i64) -> ListHealthDataQuery {
        ListHealthDataQuery {
            page: PageRequest::new(current, size),
            user_id: Some(user_id),
            start: None,
            end: None,
            is_asc: true,
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_computes_bmi_and_lists_height(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let user = create_user_with_height(&mut conn, "measured", Decimal::new(170, 0)).await;
        drop(conn);

        let service = HealthDataService::new(pool.clone(), PaginationConfig::default());
        service.create_batch(vec![measurement(user, 1, 70)]).await.unwrap();

        let page = service.list_page(query(user, 1, 15)).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.data_list[0].bmi, Decimal::new(2422, 2));
        assert_eq!(page.data_list[0].height, Some(Decimal::new(170, 0)));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_user_without_height_creates_nothing(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let measured = create_user_with_height(&mut conn, "has_height", Decimal::new(180, 0)).await;
        let unmeasured = create_test_user(&mut conn, "no_height").await;
        drop(conn);

        let service = HealthDataService::new(pool.clone(), PaginationConfig::default());
        let result = service
            .create_batch(vec![measurement(measured, 1, 80), measurement(unmeasured, 1, 60)])
            .await;
        assert!(matches!(result, Err(Error::UserHeightMissing { .. })));

        assert_eq!(service.list_page(query(measured, 1, 15)).await.unwrap().total, 0);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_unstorable_bmi_creates_nothing(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let tiny = create_user_with_height(&mut conn, "tiny", Decimal::ONE).await;
        let normal = create_user_with_height(&mut conn, "normal", Decimal::new(170, 0)).await;
        drop(conn);

        // 50 kg at 1 cm gives a BMI of 500000.00, more than the column holds
        let service = HealthDataService::new(pool.clone(), PaginationConfig::default());
        let result = service
            .create_batch(vec![measurement(normal, 1, 70), measurement(tiny, 1, 50)])
            .await;
        assert!(matches!(result, Err(Error::InvalidBodyMeasurement { .. })));

        assert_eq!(service.list_page(query(normal, 1, 15)).await.unwrap().total, 0);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_weight_update_recomputes_bmi(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let user = create_user_with_height(&mut conn, "dieter", Decimal::new(160, 0)).await;
        drop(conn);

        let service = HealthDataService::new(pool.clone(), PaginationConfig::default());
        let ids = service.create_batch(vec![measurement(user, 1, 70)]).await.unwrap();

        service
            .update_batch(vec![HealthDataUpdate {
                id: ids[0],
                heart_rate: None,
                weight: Some(Decimal::new(64, 0)),
                measurement_date: None,
            }])
            .await
            .unwrap();

        let page = service.list_page(query(user, 1, 15)).await.unwrap();
        assert_eq!(page.data_list[0].weight, Decimal::new(64, 0));
        assert_eq!(page.data_list[0].bmi.to_string(), "25.00");
        assert_eq!(page.data_list[0].heart_rate, Some(61));

        let missing = service
            .update_batch(vec![HealthDataUpdate {
                id: HealthDataId(999_999),
                heart_rate: Some(70),
                weight: None,
                measurement_date: None,
            }])
            .await;
        assert!(matches!(missing, Err(Error::NotFound { .. })));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_trend_follows_page_window(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let user = create_user_with_height(&mut conn, "trending", Decimal::new(170, 0)).await;
        drop(conn);

        let service = HealthDataService::new(pool.clone(), PaginationConfig::default());
        service
            .create_batch(vec![measurement(user, 1, 72), measurement(user, 2, 71), measurement(user, 3, 70)])
            .await
            .unwrap();

        let trend = service.trend(query(user, 1, 2)).await.unwrap();
        assert_eq!(trend.measurement_dates, vec![at(1), at(2)]);
        assert_eq!(trend.weights, vec![Decimal::new(72, 0), Decimal::new(71, 0)]);
        assert_eq!(trend.heart_rates, vec![Some(61), Some(62)]);
        assert_eq!(trend.bmis.len(), 2);

        let last = service.trend(query(user, 2, 2)).await.unwrap();
        assert_eq!(last.bmis, vec![Decimal::new(2422, 2)]);

        assert!(matches!(service.trend(query(user, 3, 2)).await, Err(Error::NotFound { .. })));
    }
}
