//! Database repository for health goals.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, Postgres, QueryBuilder};
use tracing::instrument;

use crate::api::models::health_goals::HealthGoalDetail;
use crate::db::{
    errors::{DbError, Result},
    models::health_goals::{HealthGoalCreateDBRequest, HealthGoalDBResponse, HealthGoalTypeRow, HealthGoalUpdateDBRequest},
};
use crate::services::pagination::{DetailSource, group_rows};
use crate::types::{HealthGoalId, UserId, raw_ids};

/// Filter for listing health goals
#[derive(Debug, Clone, bon::Builder)]
pub struct HealthGoalFilter {
    pub user_id: Option<UserId>,
    pub is_finished: Option<bool>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    #[builder(default = true)]
    pub ascending: bool,
}

impl HealthGoalFilter {
    fn push_conditions(&self, query: &mut QueryBuilder<'_, Postgres>) {
        if let Some(user_id) = self.user_id {
            query.push(" AND g.user_id = ");
            query.push_bind(user_id);
        }
        if let Some(is_finished) = self.is_finished {
            query.push(" AND g.is_finished = ");
            query.push_bind(is_finished);
        }
        if let Some(start) = self.start {
            query.push(" AND g.target_date >= ");
            query.push_bind(start);
        }
        if let Some(end) = self.end {
            query.push(" AND g.target_date <= ");
            query.push_bind(end);
        }
    }
}

pub struct HealthGoals<'c> {
    db: &'c mut PgConnection,
}

impl<'c> HealthGoals<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(user_id = %request.user_id), err)]
    pub async fn create(&mut self, request: &HealthGoalCreateDBRequest) -> Result<HealthGoalDBResponse> {
        let goal = sqlx::query_as::<_, HealthGoalDBResponse>(
            r#"
            INSERT INTO health_goals (user_id, target_plan, target_date, is_finished, is_abandoned)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(request.user_id)
        .bind(&request.target_plan)
        .bind(request.target_date)
        .bind(request.is_finished)
        .bind(request.is_abandoned)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(goal)
    }

    #[instrument(skip(self, request), fields(health_goal_id = %id), err)]
    pub async fn update(&mut self, id: HealthGoalId, request: &HealthGoalUpdateDBRequest) -> Result<HealthGoalDBResponse> {
        let goal = sqlx::query_as::<_, HealthGoalDBResponse>(
            r#"
            UPDATE health_goals SET
                target_plan = COALESCE($2, target_plan),
                target_date = COALESCE($3, target_date),
                is_finished = COALESCE($4, is_finished),
                is_abandoned = COALESCE($5, is_abandoned),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.target_plan)
        .bind(request.target_date)
        .bind(request.is_finished)
        .bind(request.is_abandoned)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(goal)
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    pub async fn delete_bulk(&mut self, ids: &[HealthGoalId]) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query("DELETE FROM health_goals WHERE id = ANY($1)")
            .bind(raw_ids(ids))
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected())
    }
}

#[async_trait::async_trait]
impl<'c> DetailSource for HealthGoals<'c> {
    type Filter = HealthGoalFilter;
    type Row = HealthGoalTypeRow;
    type Detail = HealthGoalDetail;

    #[instrument(skip(self, filter), err)]
    async fn fetch_window(&mut self, filter: &HealthGoalFilter, offset: i64, limit: i64) -> Result<Vec<HealthGoalTypeRow>> {
        let mut query: QueryBuilder<Postgres> = QueryBuilder::new(
            r#"
            SELECT g.*, t.id AS exercise_type_id, t.name AS exercise_type_name
            FROM health_goals g
            LEFT JOIN health_goals_exercise_types gt ON gt.health_goal_id = g.id
            LEFT JOIN exercise_types t ON t.id = gt.exercise_type_id
            WHERE 1=1
            "#,
        );

        filter.push_conditions(&mut query);

        let direction = if filter.ascending { "ASC" } else { "DESC" };
        query.push(format!(" ORDER BY g.target_date {direction}, g.id {direction}, t.id ASC LIMIT "));
        query.push_bind(limit);
        query.push(" OFFSET ");
        query.push_bind(offset);

        let rows = query.build_query_as::<HealthGoalTypeRow>().fetch_all(&mut *self.db).await?;

        Ok(rows)
    }

    #[instrument(skip(self, filter), err)]
    async fn count_parents(&mut self, filter: &HealthGoalFilter) -> Result<i64> {
        let mut query: QueryBuilder<Postgres> = QueryBuilder::new("SELECT COUNT(*) FROM health_goals g WHERE 1=1");
        filter.push_conditions(&mut query);

        let count: i64 = query.build_query_scalar().fetch_one(&mut *self.db).await?;

        Ok(count)
    }

    fn assemble(rows: Vec<HealthGoalTypeRow>) -> Vec<HealthGoalDetail> {
        group_rows(rows, |row| row.goal.id, HealthGoalTypeRow::split)
            .into_iter()
            .map(|(goal, exercise_types)| HealthGoalDetail::new(goal, exercise_types))
            .collect()
    }
}
