//! Diet records and the foods eaten in them.

use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{info, instrument};

use crate::api::models::diet_records::{DietRecordCreate, DietRecordDetail, DietRecordUpdate, FoodPortion, ListDietRecordsQuery, NutritionIntakeQuery};
use crate::api::models::pagination::PageResponse;
use crate::config::PaginationConfig;
use crate::db::{
    handlers::{
        associations::Associations,
        diet_records::{DietRecordFilter, DietRecords},
    },
    models::{
        associations::DietRecordFoods,
        diet_records::{DietNutrientRow, DietRecordCreateDBRequest, DietRecordUpdateDBRequest},
    },
};
use crate::errors::{Error, Result};
use crate::services::{
    aggregation::{AggregateResult, Nutrient, WeightedSumAggregator},
    associations::AssociationSynchronizer,
    batch::{
        check_length, check_text, check_time_range, check_unique_ids, distinct_parents, ensure_not_empty, first_duplicate, join_ids,
        or_not_found, pair_links,
    },
    pagination::PaginatedAggregateQuery,
};
use crate::types::{DietRecordId, FoodId};

const MEAL_TYPE_MAX: usize = 10;
const MEAL_NOTE_MAX: usize = 500;
const MEAL_PLACE_MAX: usize = 50;

/// Nutrition totals over a time range, with the eaten foods they were computed from
pub type NutritionIntake = AggregateResult<Nutrient, DietNutrientRow>;

fn check_foods(foods: &[FoodPortion]) -> Result<()> {
    if let Some(portion) = foods.iter().find(|portion| portion.quantity <= Decimal::ZERO) {
        return Err(Error::BadRequest {
            message: format!("quantity of food {} must be positive, got {}", portion.food_id, portion.quantity),
        });
    }
    if let Some(food_id) = first_duplicate(foods.iter().map(|portion| portion.food_id)) {
        return Err(Error::BadRequest {
            message: format!("food {food_id} is listed more than once in one meal"),
        });
    }
    Ok(())
}

fn validate_create(create: &DietRecordCreate) -> Result<()> {
    check_text("meal_type", &create.meal_type, MEAL_TYPE_MAX)?;
    check_length("meal_note", create.meal_note.as_deref(), MEAL_NOTE_MAX)?;
    check_length("meal_place", create.meal_place.as_deref(), MEAL_PLACE_MAX)?;
    check_foods(&create.foods)
}

fn validate_update(update: &DietRecordUpdate) -> Result<()> {
    if let Some(ref meal_type) = update.meal_type {
        check_text("meal_type", meal_type, MEAL_TYPE_MAX)?;
    }
    check_length("meal_note", update.meal_note.as_deref(), MEAL_NOTE_MAX)?;
    check_length("meal_place", update.meal_place.as_deref(), MEAL_PLACE_MAX)?;
    check_foods(&update.foods)
}

fn portions(foods: &[FoodPortion]) -> Vec<(FoodId, Decimal)> {
    foods.iter().map(|portion| (portion.food_id, portion.quantity)).collect()
}

pub struct DietRecordsService {
    db: PgPool,
    pagination: PaginationConfig,
}

impl DietRecordsService {
    pub fn new(db: PgPool, pagination: PaginationConfig) -> Self {
        Self { db, pagination }
    }

    /// Store every meal with its foods in one transaction and return the new ids in request order.
    #[instrument(skip_all, fields(count = requests.len()), err)]
    pub async fn create_batch(&self, requests: Vec<DietRecordCreate>) -> Result<Vec<DietRecordId>> {
        ensure_not_empty(&requests, "diet record")?;
        for request in &requests {
            validate_create(request)?;
        }

        let mut tx = self.db.begin().await.map_err(|e| Error::Database(e.into()))?;

        let mut ids = Vec::with_capacity(requests.len());
        {
            let mut repo = DietRecords::new(&mut tx);
            for request in &requests {
                let record = repo.create(&DietRecordCreateDBRequest::from_api_create(request)).await?;
                ids.push(record.id);
            }
        }

        let links = pair_links::<DietRecordFoods, _, _, _>(&ids, &requests, |request| portions(&request.foods))?;
        let linked = distinct_parents(&links).len();
        AssociationSynchronizer::new(Associations::<DietRecordFoods>::new(&mut tx))
            .replace(&ids, links)
            .await?;

        tx.commit().await.map_err(|e| Error::Database(e.into()))?;

        info!(records = ids.len(), linked, "Created diet records");
        Ok(ids)
    }

    /// Update every meal and replace its foods; any missing meal fails the whole batch.
    #[instrument(skip_all, fields(count = updates.len()), err)]
    pub async fn update_batch(&self, updates: Vec<DietRecordUpdate>) -> Result<()> {
        ensure_not_empty(&updates, "diet record")?;
        check_unique_ids(updates.iter().map(|update| update.id), "diet record")?;
        for update in &updates {
            validate_update(update)?;
        }

        let mut tx = self.db.begin().await.map_err(|e| Error::Database(e.into()))?;

        let ids: Vec<DietRecordId> = updates.iter().map(|update| update.id).collect();
        {
            let mut repo = DietRecords::new(&mut tx);
            for update in &updates {
                repo.update(update.id, &DietRecordUpdateDBRequest::from(update))
                    .await
                    .map_err(or_not_found("Diet record", update.id))?;
            }
        }

        let links = pair_links::<DietRecordFoods, _, _, _>(&ids, &updates, |update| portions(&update.foods))?;
        AssociationSynchronizer::new(Associations::<DietRecordFoods>::new(&mut tx))
            .replace(&ids, links)
            .await?;

        tx.commit().await.map_err(|e| Error::Database(e.into()))?;

        info!(records = ids.len(), "Updated diet records");
        Ok(())
    }

    /// Delete meals by id; their food links are removed with them.
    #[instrument(skip_all, fields(count = ids.len()), err)]
    pub async fn delete_batch(&self, ids: Vec<DietRecordId>) -> Result<u64> {
        ensure_not_empty(&ids, "diet record id")?;

        let mut tx = self.db.begin().await.map_err(|e| Error::Database(e.into()))?;
        let deleted = DietRecords::new(&mut tx).delete_bulk(&ids).await?;
        if deleted == 0 {
            return Err(Error::NotFound {
                resource: "Diet record".to_string(),
                id: join_ids(&ids),
            });
        }
        tx.commit().await.map_err(|e| Error::Database(e.into()))?;

        info!(deleted, "Deleted diet records");
        Ok(deleted)
    }

    /// One page of meals with their foods
    #[instrument(skip_all, fields(user_id = ?query.user_id), err)]
    pub async fn list_page(&self, query: ListDietRecordsQuery) -> Result<PageResponse<DietRecordDetail>> {
        check_time_range(query.start, query.end)?;

        let filter = DietRecordFilter::builder()
            .maybe_user_id(query.user_id)
            .maybe_meal_type(query.meal_type)
            .maybe_start(query.start)
            .maybe_end(query.end)
            .ascending(query.is_asc)
            .build();

        let mut conn = self.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
        PaginatedAggregateQuery::new(DietRecords::new(&mut conn), self.pagination)
            .list(&filter, &query.page)
            .await
    }

    /// Calories, protein, fat, carbohydrates and water eaten by a user over a time range.
    ///
    /// Each food contributes `nutrient * quantity / 100`; a range with no meals gives all-zero
    /// totals.
    #[instrument(skip_all, fields(user_id = ?query.user_id), err)]
    pub async fn nutrition_intake(&self, query: NutritionIntakeQuery) -> Result<NutritionIntake> {
        let user_id = query.user_id.ok_or(Error::AggregationInputMissing { field: "user_id" })?;
        check_time_range(query.start, query.end)?;

        let mut conn = self.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
        let rows = DietRecords::new(&mut conn).nutrient_rows(user_id, query.start, query.end).await?;

        WeightedSumAggregator::aggregate::<Nutrient, _>(rows)
    }
}
