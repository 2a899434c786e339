//! Database repository for diet records.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, Postgres, QueryBuilder};
use tracing::instrument;

use crate::api::models::diet_records::DietRecordDetail;
use crate::db::{
    errors::{DbError, Result},
    models::diet_records::{DietNutrientRow, DietRecordCreateDBRequest, DietRecordDBResponse, DietRecordFoodRow, DietRecordUpdateDBRequest},
};
use crate::services::pagination::{DetailSource, group_rows};
use crate::types::{DietRecordId, UserId, raw_ids};

/// Filter for listing diet records
#[derive(Debug, Clone, bon::Builder)]
pub struct DietRecordFilter {
    pub user_id: Option<UserId>,
    #[builder(into)]
    pub meal_type: Option<String>,
    /// Inclusive lower bound on `meal_time`
    pub start: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `meal_time`
    pub end: Option<DateTime<Utc>>,
    /// Order by meal time, oldest first
    #[builder(default = true)]
    pub ascending: bool,
}

impl DietRecordFilter {
    fn push_conditions(&self, query: &mut QueryBuilder<'_, Postgres>) {
        if let Some(user_id) = self.user_id {
            query.push(" AND r.user_id = ");
            query.push_bind(user_id);
        }
        if let Some(ref meal_type) = self.meal_type {
            query.push(" AND r.meal_type = ");
            query.push_bind(meal_type.clone());
        }
        if let Some(start) = self.start {
            query.push(" AND r.meal_time >= ");
            query.push_bind(start);
        }
        if let Some(end) = self.end {
            query.push(" AND r.meal_time <= ");
            query.push_bind(end);
        }
    }

    fn direction(&self) -> &'static str {
        if self.ascending { "ASC" } else { "DESC" }
    }
}

pub struct DietRecords<'c> {
    db: &'c mut PgConnection,
}

impl<'c> DietRecords<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(user_id = %request.user_id, meal_type = %request.meal_type), err)]
    pub async fn create(&mut self, request: &DietRecordCreateDBRequest) -> Result<DietRecordDBResponse> {
        let record = sqlx::query_as::<_, DietRecordDBResponse>(
            r#"
            INSERT INTO diet_records (user_id, meal_type, meal_time, meal_note, meal_place)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(request.user_id)
        .bind(&request.meal_type)
        .bind(request.meal_time)
        .bind(&request.meal_note)
        .bind(&request.meal_place)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(record)
    }

    #[instrument(skip(self), fields(diet_record_id = %id), err)]
    pub async fn get_by_id(&mut self, id: DietRecordId) -> Result<Option<DietRecordDBResponse>> {
        let record = sqlx::query_as::<_, DietRecordDBResponse>("SELECT * FROM diet_records WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(record)
    }

    #[instrument(skip(self, request), fields(diet_record_id = %id), err)]
    pub async fn update(&mut self, id: DietRecordId, request: &DietRecordUpdateDBRequest) -> Result<DietRecordDBResponse> {
        let record = sqlx::query_as::<_, DietRecordDBResponse>(
            r#"
            UPDATE diet_records SET
                meal_type = COALESCE($2, meal_type),
                meal_time = COALESCE($3, meal_time),
                meal_note = COALESCE($4, meal_note),
                meal_place = COALESCE($5, meal_place),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.meal_type)
        .bind(request.meal_time)
        .bind(&request.meal_note)
        .bind(&request.meal_place)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(record)
    }

    /// Delete records by id; their food links go with them
    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    pub async fn delete_bulk(&mut self, ids: &[DietRecordId]) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query("DELETE FROM diet_records WHERE id = ANY($1)")
            .bind(raw_ids(ids))
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected())
    }

    /// Every eaten food of the user's records in the time range, oldest meal first
    #[instrument(skip(self), fields(user_id = %user_id), err)]
    pub async fn nutrient_rows(
        &mut self,
        user_id: UserId,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<DietNutrientRow>> {
        let mut query: QueryBuilder<Postgres> = QueryBuilder::new(
            r#"
            SELECT r.id AS diet_record_id, r.meal_type, r.meal_time,
                   f.id AS food_id, f.name AS food_name, rf.quantity,
                   f.calories, f.protein, f.fat, f.carbohydrates, f.water
            FROM diet_records r
            JOIN diet_records_foods rf ON rf.diet_record_id = r.id
            JOIN diet_foods f ON f.id = rf.food_id
            WHERE 1=1
            "#,
        );

        let filter = DietRecordFilter::builder().user_id(user_id).maybe_start(start).maybe_end(end).build();
        filter.push_conditions(&mut query);
        query.push(" ORDER BY r.meal_time, r.id, f.id");

        let rows = query.build_query_as::<DietNutrientRow>().fetch_all(&mut *self.db).await?;

        Ok(rows)
    }
}

#[async_trait::async_trait]
impl<'c> DetailSource for DietRecords<'c> {
    type Filter = DietRecordFilter;
    type Row = DietRecordFoodRow;
    type Detail = DietRecordDetail;

    #[instrument(skip(self, filter), err)]
    async fn fetch_window(&mut self, filter: &DietRecordFilter, offset: i64, limit: i64) -> Result<Vec<DietRecordFoodRow>> {
        let mut query: QueryBuilder<Postgres> = QueryBuilder::new(
            r#"
            SELECT r.*,
                   f.id AS food_id, f.name AS food_name, rf.quantity,
                   f.calories, f.protein, f.fat, f.carbohydrates, f.water, f.food_type
            FROM diet_records r
            LEFT JOIN diet_records_foods rf ON rf.diet_record_id = r.id
            LEFT JOIN diet_foods f ON f.id = rf.food_id
            WHERE 1=1
            "#,
        );

        filter.push_conditions(&mut query);

        let direction = filter.direction();
        query.push(format!(" ORDER BY r.meal_time {direction}, r.id {direction}, f.id ASC LIMIT "));
        query.push_bind(limit);
        query.push(" OFFSET ");
        query.push_bind(offset);

        let rows = query.build_query_as::<DietRecordFoodRow>().fetch_all(&mut *self.db).await?;

        Ok(rows)
    }

    #[instrument(skip(self, filter), err)]
    async fn count_parents(&mut self, filter: &DietRecordFilter) -> Result<i64> {
        let mut query: QueryBuilder<Postgres> = QueryBuilder::new("SELECT COUNT(*) FROM diet_records r WHERE 1=1");
        filter.push_conditions(&mut query);

        let count: i64 = query.build_query_scalar().fetch_one(&mut *self.db).await?;

        Ok(count)
    }

    fn assemble(rows: Vec<DietRecordFoodRow>) -> Vec<DietRecordDetail> {
        group_rows(rows, |row| row.record.id, DietRecordFoodRow::split)
            .into_iter()
            .map(|(record, foods)| DietRecordDetail::new(record, foods))
            .collect()
    }
}
