//! Health goals and the exercise types that serve them.

use sqlx::PgPool;
use tracing::{info, instrument};

use crate::api::models::health_goals::{HealthGoalCreate, HealthGoalDetail, HealthGoalUpdate, ListHealthGoalsQuery};
use crate::api::models::pagination::PageResponse;
use crate::config::PaginationConfig;
use crate::db::{
    handlers::{
        associations::Associations,
        health_goals::{HealthGoalFilter, HealthGoals},
    },
    models::{
        associations::HealthGoalExerciseTypes,
        health_goals::{HealthGoalCreateDBRequest, HealthGoalUpdateDBRequest},
    },
};
use crate::errors::{Error, Result};
use crate::services::{
    associations::AssociationSynchronizer,
    batch::{check_text, check_time_range, check_unique_ids, ensure_not_empty, first_duplicate, join_ids, or_not_found, pair_links},
    pagination::PaginatedAggregateQuery,
};
use crate::types::{ExerciseTypeId, HealthGoalId};

const TARGET_PLAN_MAX: usize = 500;

fn validate(target_plan: Option<&str>, exercise_type_ids: &[ExerciseTypeId]) -> Result<()> {
    if let Some(plan) = target_plan {
        check_text("target_plan", plan, TARGET_PLAN_MAX)?;
    }
    if let Some(id) = first_duplicate(exercise_type_ids.iter().copied()) {
        return Err(Error::BadRequest {
            message: format!("exercise type {id} is listed more than once in one goal"),
        });
    }
    Ok(())
}

fn type_links(exercise_type_ids: &[ExerciseTypeId]) -> Vec<(ExerciseTypeId, ())> {
    exercise_type_ids.iter().map(|id| (*id, ())).collect()
}

pub struct HealthGoalsService {
    db: PgPool,
    pagination: PaginationConfig,
}

impl HealthGoalsService {
    pub fn new(db: PgPool, pagination: PaginationConfig) -> Self {
        Self { db, pagination }
    }

    #[instrument(skip_all, fields(count = requests.len()), err)]
    pub async fn create_batch(&self, requests: Vec<HealthGoalCreate>) -> Result<Vec<HealthGoalId>> {
        ensure_not_empty(&requests, "health goal")?;
        for request in &requests {
            validate(Some(&request.target_plan), &request.exercise_type_ids)?;
        }

        let mut tx = self.db.begin().await.map_err(|e| Error::Database(e.into()))?;

        let mut ids = Vec::with_capacity(requests.len());
        {
            let mut repo = HealthGoals::new(&mut tx);
            for request in &requests {
                let goal = repo.create(&HealthGoalCreateDBRequest::from_api_create(request)).await?;
                ids.push(goal.id);
            }
        }

        let links = pair_links::<HealthGoalExerciseTypes, _, _, _>(&ids, &requests, |request| type_links(&request.exercise_type_ids))?;
        AssociationSynchronizer::new(Associations::<HealthGoalExerciseTypes>::new(&mut tx))
            .replace(&ids, links)
            .await?;

        tx.commit().await.map_err(|e| Error::Database(e.into()))?;

        info!(goals = ids.len(), "Created health goals");
        Ok(ids)
    }

    #[instrument(skip_all, fields(count = updates.len()), err)]
    pub async fn update_batch(&self, updates: Vec<HealthGoalUpdate>) -> Result<()> {
        ensure_not_empty(&updates, "health goal")?;
        check_unique_ids(updates.iter().map(|update| update.id), "health goal")?;
        for update in &updates {
            validate(update.target_plan.as_deref(), &update.exercise_type_ids)?;
        }

        let mut tx = self.db.begin().await.map_err(|e| Error::Database(e.into()))?;

        let ids: Vec<HealthGoalId> = updates.iter().map(|update| update.id).collect();
        {
            let mut repo = HealthGoals::new(&mut tx);
            for update in &updates {
                repo.update(update.id, &HealthGoalUpdateDBRequest::from(update))
                    .await
                    .map_err(or_not_found("Health goal", update.id))?;
            }
        }

        let links = pair_links::<HealthGoalExerciseTypes, _, _, _>(&ids, &updates, |update| type_links(&update.exercise_type_ids))?;
        AssociationSynchronizer::new(Associations::<HealthGoalExerciseTypes>::new(&mut tx))
            .replace(&ids, links)
            .await?;

        tx.commit().await.map_err(|e| Error::Database(e.into()))?;

        info!(goals = ids.len(), "Updated health goals");
        Ok(())
    }

    #[instrument(skip_all, fields(count = ids.len()), err)]
    pub async fn delete_batch(&self, ids: Vec<HealthGoalId>) -> Result<u64> {
        ensure_not_empty(&ids, "health goal id")?;

        let mut tx = self.db.begin().await.map_err(|e| Error::Database(e.into()))?;
        let deleted = HealthGoals::new(&mut tx).delete_bulk(&ids).await?;
        if deleted == 0 {
            return Err(Error::NotFound {
                resource: "Health goal".to_string(),
                id: join_ids(&ids),
            });
        }
        tx.commit().await.map_err(|e| Error::Database(e.into()))?;

        info!(deleted, "Deleted health goals");
        Ok(deleted)
    }

    #[instrument(skip_all, fields(user_id = ?query.user_id), err)]
    pub async fn list_page(&self, query: ListHealthGoalsQuery) -> Result<PageResponse<HealthGoalDetail>> {
        check_time_range(query.start, query.end)?;

        let filter = HealthGoalFilter::builder()
            .maybe_user_id(query.user_id)
            .maybe_is_finished(query.is_finished)
            .maybe_start(query.start)
            .maybe_end(query.end)
            .ascending(query.is_asc)
            .build();

        let mut conn = self.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
        PaginatedAggregateQuery::new(HealthGoals::new(&mut conn), self.pagination)
            .list(&filter, &query.page)
            .await
    }
}


#[cfg(all(test, feature = "postgres-tests"))]
mod postgres_tests {
    use super::*;
    use crate::api::models::pagination::PageRequest;
    use crate::test_utils::{create_exercise_type, create_test_user};
    use crate::types::UserId;
    use chrono::{TimeZone, Utc};

    fn goal(user_id: UserId, plan: &str, types: &[ExerciseTypeId]) -> HealthGoalCreate {
        HealthGoalCreate {
            user_id,
            target_plan: plan.to_string(),
            target_date: Utc.with_ymd_and_hms(2025, 9, 1, 0, 0, 0).unwrap(),
            is_finished: false,
            is_abandoned: false,
            exercise_type_ids: types.to_vec(),
        }
    }

    fn list_query(user_id: UserId, current: i64, size: i64) -> ListHealthGoalsQuery {
        ListHealthGoalsQuery {
            page: PageRequest::new(current, size),
            user_id: Some(user_id),
            is_finished: None,
            start: None,
            end: None,
            is_asc: true,
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_goals_round_trip_through_service(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let user = create_test_user(&mut conn, "planner").await;
        let yoga = create_exercise_type(&mut conn, "Yoga").await;
        let swim = create_exercise_type(&mut conn, "Swim").await;
        drop(conn);

        let service = HealthGoalsService::new(pool.clone(), PaginationConfig::default());
        let ids = service
            .create_batch(vec![goal(user, "Flexibility", &[yoga]), goal(user, "Endurance", &[swim, yoga])])
            .await
            .unwrap();

        service
            .update_batch(vec![HealthGoalUpdate {
                id: ids[0],
                target_plan: None,
                target_date: None,
                is_finished: Some(true),
                is_abandoned: None,
                exercise_type_ids: vec![yoga, swim],
            }])
            .await
            .unwrap();

        let page = service.list_page(list_query(user, 1, 15)).await.unwrap();
        assert_eq!(page.total, 2);
        assert!(page.data_list[0].is_finished);
        assert_eq!(page.data_list[0].exercise_types.len(), 2);

        // Page past the end keeps the metadata but has no rows
        let beyond = service.list_page(list_query(user, 5, 15)).await.unwrap();
        assert_eq!(beyond.total, 2);
        assert!(beyond.data_list.is_empty());
        assert!(beyond.has_previous);
        assert!(!beyond.has_next);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_duplicate_type_link_is_rejected(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let user = create_test_user(&mut conn, "dup_goal").await;
        let yoga = create_exercise_type(&mut conn, "Yoga").await;
        drop(conn);

        let service = HealthGoalsService::new(pool.clone(), PaginationConfig::default());
        let result = service.create_batch(vec![goal(user, "Stretch", &[yoga, yoga])]).await;
        assert!(matches!(result, Err(Error::BadRequest { .. })));

        let page = service.list_page(list_query(user, 1, 15)).await.unwrap();
        assert_eq!(page, PageResponse::empty());
    }
}
