//! Exercise records and their exercise types.

use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{info, instrument};

use crate::api::models::exercise_records::{ExerciseRecordCreate, ExerciseRecordDetail, ExerciseRecordUpdate, ListExerciseRecordsQuery};
use crate::api::models::pagination::PageResponse;
use crate::config::PaginationConfig;
use crate::db::{
    handlers::{
        associations::Associations,
        exercise_records::{ExerciseRecordFilter, ExerciseRecords},
    },
    models::{
        associations::ExerciseRecordTypes,
        exercise_records::{ExerciseRecordCreateDBRequest, ExerciseRecordUpdateDBRequest},
    },
};
use crate::errors::{Error, Result};
use crate::services::{
    associations::AssociationSynchronizer,
    batch::{check_length, check_time_range, check_unique_ids, ensure_not_empty, first_duplicate, join_ids, or_not_found, pair_links},
    pagination::PaginatedAggregateQuery,
};
use crate::types::{ExerciseRecordId, ExerciseTypeId};

const EXERCISE_NOTE_MAX: usize = 500;

fn check_non_negative<T: PartialOrd + Default + std::fmt::Display>(field: &str, value: Option<T>) -> Result<()> {
    match value {
        Some(value) if value < T::default() => Err(Error::BadRequest {
            message: format!("{field} must not be negative, got {value}"),
        }),
        _ => Ok(()),
    }
}

fn check_types(exercise_type_ids: &[ExerciseTypeId]) -> Result<()> {
    match first_duplicate(exercise_type_ids.iter().copied()) {
        Some(id) => Err(Error::BadRequest {
            message: format!("exercise type {id} is listed more than once in one record"),
        }),
        None => Ok(()),
    }
}

fn validate_measures(
    duration: Option<i32>,
    distance: Option<Decimal>,
    calories_burned: Option<Decimal>,
    heart_rate: Option<i32>,
    exercise_note: Option<&str>,
) -> Result<()> {
    check_non_negative("duration", duration)?;
    check_non_negative("distance", distance)?;
    check_non_negative("calories_burned", calories_burned)?;
    check_non_negative("heart_rate", heart_rate)?;
    check_length("exercise_note", exercise_note, EXERCISE_NOTE_MAX)
}

fn validate_create(create: &ExerciseRecordCreate) -> Result<()> {
    validate_measures(
        Some(create.duration),
        create.distance,
        create.calories_burned,
        create.heart_rate,
        create.exercise_note.as_deref(),
    )?;
    check_types(&create.exercise_type_ids)
}

fn validate_update(update: &ExerciseRecordUpdate) -> Result<()> {
    validate_measures(
        update.duration,
        update.distance,
        update.calories_burned,
        update.heart_rate,
        update.exercise_note.as_deref(),
    )?;
    check_types(&update.exercise_type_ids)
}

fn type_links(exercise_type_ids: &[ExerciseTypeId]) -> Vec<(ExerciseTypeId, ())> {
    exercise_type_ids.iter().map(|id| (*id, ())).collect()
}

pub struct ExerciseRecordsService {
    db: PgPool,
    pagination: PaginationConfig,
}

impl ExerciseRecordsService {
    pub fn new(db: PgPool, pagination: PaginationConfig) -> Self {
        Self { db, pagination }
    }

    #[instrument(skip_all, fields(count = requests.len()), err)]
    pub async fn create_batch(&self, requests: Vec<ExerciseRecordCreate>) -> Result<Vec<ExerciseRecordId>> {
        ensure_not_empty(&requests, "exercise record")?;
        for request in &requests {
            validate_create(request)?;
        }

        let mut tx = self.db.begin().await.map_err(|e| Error::Database(e.into()))?;

        let mut ids = Vec::with_capacity(requests.len());
        {
            let mut repo = ExerciseRecords::new(&mut tx);
            for request in &requests {
                let record = repo.create(&ExerciseRecordCreateDBRequest::from_api_create(request)).await?;
                ids.push(record.id);
            }
        }

        let links = pair_links::<ExerciseRecordTypes, _, _, _>(&ids, &requests, |request| type_links(&request.exercise_type_ids))?;
        AssociationSynchronizer::new(Associations::<ExerciseRecordTypes>::new(&mut tx))
            .replace(&ids, links)
            .await?;

        tx.commit().await.map_err(|e| Error::Database(e.into()))?;

        info!(records = ids.len(), "Created exercise records");
        Ok(ids)
    }

    #[instrument(skip_all, fields(count = updates.len()), err)]
    pub async fn update_batch(&self, updates: Vec<ExerciseRecordUpdate>) -> Result<()> {
        ensure_not_empty(&updates, "exercise record")?;
        check_unique_ids(updates.iter().map(|update| update.id), "exercise record")?;
        for update in &updates {
            validate_update(update)?;
        }

        let mut tx = self.db.begin().await.map_err(|e| Error::Database(e.into()))?;

        let ids: Vec<ExerciseRecordId> = updates.iter().map(|update| update.id).collect();
        {
            let mut repo = ExerciseRecords::new(&mut tx);
            for update in &updates {
                repo.update(update.id, &ExerciseRecordUpdateDBRequest::from(update))
                    .await
                    .map_err(or_not_found("Exercise record", update.id))?;
            }
        }

        let links = pair_links::<ExerciseRecordTypes, _, _, _>(&ids, &updates, |update| type_links(&update.exercise_type_ids))?;
        AssociationSynchronizer::new(Associations::<ExerciseRecordTypes>::new(&mut tx))
            .replace(&ids, links)
            .await?;

        tx.commit().await.map_err(|e| Error::Database(e.into()))?;

        info!(records = ids.len(), "Updated exercise records");
        Ok(())
    }

    #[instrument(skip_all, fields(count = ids.len()), err)]
    pub async fn delete_batch(&self, ids: Vec<ExerciseRecordId>) -> Result<u64> {
        ensure_not_empty(&ids, "exercise record id")?;

        let mut tx = self.db.begin().await.map_err(|e| Error::Database(e.into()))?;
        let deleted = ExerciseRecords::new(&mut tx).delete_bulk(&ids).await?;
        if deleted == 0 {
            return Err(Error::NotFound {
                resource: "Exercise record".to_string(),
                id: join_ids(&ids),
            });
        }
        tx.commit().await.map_err(|e| Error::Database(e.into()))?;

        info!(deleted, "Deleted exercise records");
        Ok(deleted)
    }

    #[instrument(skip_all, fields(user_id = ?query.user_id), err)]
    pub async fn list_page(&self, query: ListExerciseRecordsQuery) -> Result<PageResponse<ExerciseRecordDetail>> {
        check_time_range(query.start, query.end)?;

        let filter = ExerciseRecordFilter::builder()
            .maybe_user_id(query.user_id)
            .maybe_start(query.start)
            .maybe_end(query.end)
            .ascending(query.is_asc)
            .build();

        let mut conn = self.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
        PaginatedAggregateQuery::new(ExerciseRecords::new(&mut conn), self.pagination)
            .list(&filter, &query.page)
            .await
    }
}
