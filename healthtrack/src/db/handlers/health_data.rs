//! Database repository for body measurements.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, Postgres, QueryBuilder};
use tracing::instrument;

use crate::api::models::health_data::HealthDataDetail;
use crate::db::{
    errors::{DbError, Result},
    models::health_data::{HealthDataCreateDBRequest, HealthDataDBResponse, HealthDataRow, HealthDataUpdateDBRequest},
};
use crate::services::pagination::DetailSource;
use crate::types::{HealthDataId, UserId, raw_ids};

/// Filter for listing measurements
#[derive(Debug, Clone, bon::Builder)]
pub struct HealthDataFilter {
    pub user_id: Option<UserId>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    #[builder(default = true)]
    pub ascending: bool,
}

impl HealthDataFilter {
    fn push_conditions(&self, query: &mut QueryBuilder<'_, Postgres>) {
        if let Some(user_id) = self.user_id {
            query.push(" AND d.user_id = ");
            query.push_bind(user_id);
        }
        if let Some(start) = self.start {
            query.push(" AND d.measurement_date >= ");
            query.push_bind(start);
        }
        if let Some(end) = self.end {
            query.push(" AND d.measurement_date <= ");
            query.push_bind(end);
        }
    }
}

pub struct HealthData<'c> {
    db: &'c mut PgConnection,
}

impl<'c> HealthData<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(user_id = %request.user_id), err)]
    pub async fn create(&mut self, request: &HealthDataCreateDBRequest) -> Result<HealthDataDBResponse> {
        let data = sqlx::query_as::<_, HealthDataDBResponse>(
            r#"
            INSERT INTO health_data (user_id, heart_rate, weight, bmi, measurement_date)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(request.user_id)
        .bind(request.heart_rate)
        .bind(request.weight)
        .bind(request.bmi)
        .bind(request.measurement_date)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(data)
    }

    #[instrument(skip(self), fields(health_data_id = %id), err)]
    pub async fn get_by_id(&mut self, id: HealthDataId) -> Result<Option<HealthDataDBResponse>> {
        let data = sqlx::query_as::<_, HealthDataDBResponse>("SELECT * FROM health_data WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(data)
    }

    #[instrument(skip(self, request), fields(health_data_id = %id), err)]
    pub async fn update(&mut self, id: HealthDataId, request: &HealthDataUpdateDBRequest) -> Result<HealthDataDBResponse> {
        let data = sqlx::query_as::<_, HealthDataDBResponse>(
            r#"
            UPDATE health_data SET
                heart_rate = COALESCE($2, heart_rate),
                weight = COALESCE($3, weight),
                bmi = COALESCE($4, bmi),
                measurement_date = COALESCE($5, measurement_date),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(request.heart_rate)
        .bind(request.weight)
        .bind(request.bmi)
        .bind(request.measurement_date)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(data)
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    pub async fn delete_bulk(&mut self, ids: &[HealthDataId]) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query("DELETE FROM health_data WHERE id = ANY($1)")
            .bind(raw_ids(ids))
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected())
    }
}

#[async_trait::async_trait]
impl<'c> DetailSource for HealthData<'c> {
    type Filter = HealthDataFilter;
    type Row = HealthDataRow;
    type Detail = HealthDataDetail;

    #[instrument(skip(self, filter), err)]
    async fn fetch_window(&mut self, filter: &HealthDataFilter, offset: i64, limit: i64) -> Result<Vec<HealthDataRow>> {
        let mut query: QueryBuilder<Postgres> = QueryBuilder::new(
            r#"
            SELECT d.*, u.height
            FROM health_data d
            JOIN users u ON u.id = d.user_id
            WHERE 1=1
            "#,
        );

        filter.push_conditions(&mut query);

        let direction = if filter.ascending { "ASC" } else { "DESC" };
        query.push(format!(" ORDER BY d.measurement_date {direction}, d.id {direction} LIMIT "));
        query.push_bind(limit);
        query.push(" OFFSET ");
        query.push_bind(offset);

        let rows = query.build_query_as::<HealthDataRow>().fetch_all(&mut *self.db).await?;

        Ok(rows)
    }

    #[instrument(skip(self, filter), err)]
    async fn count_parents(&mut self, filter: &HealthDataFilter) -> Result<i64> {
        let mut query: QueryBuilder<Postgres> = QueryBuilder::new("SELECT COUNT(*) FROM health_data d WHERE 1=1");
        filter.push_conditions(&mut query);

        let count: i64 = query.build_query_scalar().fetch_one(&mut *self.db).await?;

        Ok(count)
    }

    fn assemble(rows: Vec<HealthDataRow>) -> Vec<HealthDataDetail> {
        rows.into_iter().map(|row| HealthDataDetail::new(row.data, row.height)).collect()
    }
}
