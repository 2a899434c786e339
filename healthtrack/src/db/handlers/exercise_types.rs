//! Database repository for exercise types.

use std::collections::HashMap;

use sqlx::{PgConnection, Postgres, QueryBuilder};
use tracing::instrument;

use crate::db::{
    errors::{DbError, Result},
    handlers::{contains_pattern, repository::Repository},
    models::exercise_types::{ExerciseTypeCreateDBRequest, ExerciseTypeDBResponse, ExerciseTypeUpdateDBRequest},
};
use crate::types::{ExerciseTypeId, raw_ids};

/// Filter for listing exercise types
#[derive(Debug, Clone)]
pub struct ExerciseTypeFilter {
    pub skip: i64,
    pub limit: i64,
    pub search: Option<String>,
}

impl ExerciseTypeFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self { skip, limit, search: None }
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    fn push_conditions(&self, query: &mut QueryBuilder<'_, Postgres>) {
        if let Some(ref search) = self.search {
            query.push(" AND LOWER(name) LIKE ");
            query.push_bind(contains_pattern(search));
            query.push(" ESCAPE '\\'");
        }
    }
}

pub struct ExerciseTypes<'c> {
    db: &'c mut PgConnection,
}

impl<'c> ExerciseTypes<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, filter), err)]
    pub async fn count(&mut self, filter: &ExerciseTypeFilter) -> Result<i64> {
        let mut query: QueryBuilder<Postgres> = QueryBuilder::new("SELECT COUNT(*) FROM exercise_types WHERE 1=1");
        filter.push_conditions(&mut query);

        let count: i64 = query.build_query_scalar().fetch_one(&mut *self.db).await?;

        Ok(count)
    }
}

#[async_trait::async_trait]
impl<'c> Repository for ExerciseTypes<'c> {
    type CreateRequest = ExerciseTypeCreateDBRequest;
    type UpdateRequest = ExerciseTypeUpdateDBRequest;
    type Response = ExerciseTypeDBResponse;
    type Id = ExerciseTypeId;
    type Filter = ExerciseTypeFilter;

    #[instrument(skip(self, request), fields(name = %request.name), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let exercise_type = sqlx::query_as::<_, ExerciseTypeDBResponse>("INSERT INTO exercise_types (name) VALUES ($1) RETURNING *")
            .bind(&request.name)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(exercise_type)
    }

    #[instrument(skip(self), fields(exercise_type_id = %id), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let exercise_type = sqlx::query_as::<_, ExerciseTypeDBResponse>("SELECT * FROM exercise_types WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(exercise_type)
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    async fn get_bulk(&mut self, ids: Vec<ExerciseTypeId>) -> Result<HashMap<ExerciseTypeId, ExerciseTypeDBResponse>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let types = sqlx::query_as::<_, ExerciseTypeDBResponse>("SELECT * FROM exercise_types WHERE id = ANY($1)")
            .bind(raw_ids(&ids))
            .fetch_all(&mut *self.db)
            .await?;

        Ok(types.into_iter().map(|t| (t.id, t)).collect())
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query: QueryBuilder<Postgres> = QueryBuilder::new("SELECT * FROM exercise_types WHERE 1=1");
        filter.push_conditions(&mut query);

        query.push(" ORDER BY name LIMIT ");
        query.push_bind(filter.limit);
        query.push(" OFFSET ");
        query.push_bind(filter.skip);

        let types = query.build_query_as::<ExerciseTypeDBResponse>().fetch_all(&mut *self.db).await?;

        Ok(types)
    }

    #[instrument(skip(self), fields(exercise_type_id = %id), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM exercise_types WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(exercise_type_id = %id), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let exercise_type = sqlx::query_as::<_, ExerciseTypeDBResponse>(
            r#"
            UPDATE exercise_types SET
                name = COALESCE($2, name),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.name)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(exercise_type)
    }
}

#[cfg(all(test, feature = "postgres-tests"))]
mod tests {
    use super::*;
    use crate::db::handlers::associations::{Associations, LinkStore};
    use crate::db::models::associations::{AssociationLink, HealthGoalExerciseTypes};
    use crate::test_utils::{create_health_goal, create_test_user};
    use sqlx::PgPool;

    fn named(name: &str) -> ExerciseTypeCreateDBRequest {
        ExerciseTypeCreateDBRequest { name: name.to_string() }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_names_are_unique(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = ExerciseTypes::new(&mut conn);

        repo.create(&named("Running")).await.unwrap();
        let duplicate = repo.create(&named("Running")).await;

        match duplicate {
            Err(DbError::UniqueViolation { constraint, .. }) => {
                assert_eq!(constraint.as_deref(), Some("exercise_types_name_unique"));
            }
            other => panic!("expected unique violation, got {other:?}"),
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_rename_and_list(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = ExerciseTypes::new(&mut conn);

        let swim = repo.create(&named("Swim")).await.unwrap();
        repo.create(&named("Cycling")).await.unwrap();

        let renamed = repo
            .update(
                swim.id,
                &ExerciseTypeUpdateDBRequest {
                    name: Some("Swimming".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.name, "Swimming");

        let unchanged = repo.update(swim.id, &ExerciseTypeUpdateDBRequest::default()).await.unwrap();
        assert_eq!(unchanged.name, "Swimming");

        let names: Vec<_> = repo.list(&ExerciseTypeFilter::new(0, 10)).await.unwrap().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["Cycling", "Swimming"]);

        let searched = repo.list(&ExerciseTypeFilter::new(0, 10).with_search("swim")).await.unwrap();
        assert_eq!(searched.len(), 1);
        assert_eq!(repo.count(&ExerciseTypeFilter::new(0, 1)).await.unwrap(), 2);
        assert_eq!(repo.count(&ExerciseTypeFilter::new(0, 1).with_search("swim")).await.unwrap(), 1);

        // wildcards are matched literally
        assert!(repo.list(&ExerciseTypeFilter::new(0, 10).with_search("%")).await.unwrap().is_empty());
        assert_eq!(repo.count(&ExerciseTypeFilter::new(0, 10).with_search("_")).await.unwrap(), 0);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_referenced_type_cannot_be_deleted(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let user = create_test_user(&mut conn, "goal_owner").await;
        let goal = create_health_goal(&mut conn, user).await;
        let yoga = ExerciseTypes::new(&mut conn).create(&named("Yoga")).await.unwrap();

        Associations::<HealthGoalExerciseTypes>::new(&mut conn)
            .insert_links(&[AssociationLink::between(goal, yoga.id)])
            .await
            .unwrap();

        let result = ExerciseTypes::new(&mut conn).delete(yoga.id).await;
        assert!(matches!(result, Err(DbError::ForeignKeyViolation { .. })));
    }
}
