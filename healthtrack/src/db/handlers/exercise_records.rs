//! Database repository for exercise records.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, Postgres, QueryBuilder};
use tracing::instrument;

use crate::api::models::exercise_records::ExerciseRecordDetail;
use crate::db::{
    errors::{DbError, Result},
    models::exercise_records::{ExerciseRecordCreateDBRequest, ExerciseRecordDBResponse, ExerciseRecordTypeRow, ExerciseRecordUpdateDBRequest},
};
use crate::services::pagination::{DetailSource, group_rows};
use crate::types::{ExerciseRecordId, UserId, raw_ids};

/// Filter for listing exercise records
#[derive(Debug, Clone, bon::Builder)]
pub struct ExerciseRecordFilter {
    pub user_id: Option<UserId>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    #[builder(default = true)]
    pub ascending: bool,
}

impl ExerciseRecordFilter {
    fn push_conditions(&self, query: &mut QueryBuilder<'_, Postgres>) {
        if let Some(user_id) = self.user_id {
            query.push(" AND r.user_id = ");
            query.push_bind(user_id);
        }
        if let Some(start) = self.start {
            query.push(" AND r.exercise_date >= ");
            query.push_bind(start);
        }
        if let Some(end) = self.end {
            query.push(" AND r.exercise_date <= ");
            query.push_bind(end);
        }
    }
}

pub struct ExerciseRecords<'c> {
    db: &'c mut PgConnection,
}

impl<'c> ExerciseRecords<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(user_id = %request.user_id), err)]
    pub async fn create(&mut self, request: &ExerciseRecordCreateDBRequest) -> Result<ExerciseRecordDBResponse> {
        let record = sqlx::query_as::<_, ExerciseRecordDBResponse>(
            r#"
            INSERT INTO exercise_records (user_id, duration, distance, calories_burned, heart_rate, exercise_note, exercise_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(request.user_id)
        .bind(request.duration)
        .bind(request.distance)
        .bind(request.calories_burned)
        .bind(request.heart_rate)
        .bind(&request.exercise_note)
        .bind(request.exercise_date)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(record)
    }

    #[instrument(skip(self, request), fields(exercise_record_id = %id), err)]
    pub async fn update(&mut self, id: ExerciseRecordId, request: &ExerciseRecordUpdateDBRequest) -> Result<ExerciseRecordDBResponse> {
        let record = sqlx::query_as::<_, ExerciseRecordDBResponse>(
            r#"
            UPDATE exercise_records SET
                duration = COALESCE($2, duration),
                distance = COALESCE($3, distance),
                calories_burned = COALESCE($4, calories_burned),
                heart_rate = COALESCE($5, heart_rate),
                exercise_note = COALESCE($6, exercise_note),
                exercise_date = COALESCE($7, exercise_date),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(request.duration)
        .bind(request.distance)
        .bind(request.calories_burned)
        .bind(request.heart_rate)
        .bind(&request.exercise_note)
        .bind(request.exercise_date)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(record)
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    pub async fn delete_bulk(&mut self, ids: &[ExerciseRecordId]) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query("DELETE FROM exercise_records WHERE id = ANY($1)")
            .bind(raw_ids(ids))
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected())
    }
}

#[async_trait::async_trait]
impl<'c> DetailSource for ExerciseRecords<'c> {
    type Filter = ExerciseRecordFilter;
    type Row = ExerciseRecordTypeRow;
    type Detail = ExerciseRecordDetail;

    #[instrument(skip(self, filter), err)]
    async fn fetch_window(&mut self, filter: &ExerciseRecordFilter, offset: i64, limit: i64) -> Result<Vec<ExerciseRecordTypeRow>> {
        let mut query: QueryBuilder<Postgres> = QueryBuilder::new(
            r#"
            SELECT r.*, t.id AS exercise_type_id, t.name AS exercise_type_name
            FROM exercise_records r
            LEFT JOIN exercise_records_types rt ON rt.exercise_record_id = r.id
            LEFT JOIN exercise_types t ON t.id = rt.exercise_type_id
            WHERE 1=1
            "#,
        );

        filter.push_conditions(&mut query);

        let direction = if filter.ascending { "ASC" } else { "DESC" };
        query.push(format!(" ORDER BY r.exercise_date {direction}, r.id {direction}, t.id ASC LIMIT "));
        query.push_bind(limit);
        query.push(" OFFSET ");
        query.push_bind(offset);

        let rows = query.build_query_as::<ExerciseRecordTypeRow>().fetch_all(&mut *self.db).await?;

        Ok(rows)
    }

    #[instrument(skip(self, filter), err)]
    async fn count_parents(&mut self, filter: &ExerciseRecordFilter) -> Result<i64> {
        let mut query: QueryBuilder<Postgres> = QueryBuilder::new("SELECT COUNT(*) FROM exercise_records r WHERE 1=1");
        filter.push_conditions(&mut query);

        let count: i64 = query.build_query_scalar().fetch_one(&mut *self.db).await?;

        Ok(count)
    }

    fn assemble(rows: Vec<ExerciseRecordTypeRow>) -> Vec<ExerciseRecordDetail> {
        group_rows(rows, |row| row.record.id, ExerciseRecordTypeRow::split)
            .into_iter()
            .map(|(record, exercise_types)| ExerciseRecordDetail::new(record, exercise_types))
            .collect()
    }
}
