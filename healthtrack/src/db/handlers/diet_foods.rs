//! Database repository for foods.

use std::collections::HashMap;

use sqlx::{PgConnection, Postgres, QueryBuilder};
use tracing::instrument;

use crate::db::{
    errors::{DbError, Result},
    handlers::{contains_pattern, repository::Repository},
    models::diet_foods::{DietFoodCreateDBRequest, DietFoodDBResponse, DietFoodUpdateDBRequest},
};
use crate::types::{FoodId, raw_ids};

/// Filter for listing foods
#[derive(Debug, Clone)]
pub struct DietFoodFilter {
    pub skip: i64,
    pub limit: i64,
    pub search: Option<String>,    // Case-insensitive substring search on name
    pub food_type: Option<String>, // Case-insensitive substring search on food_type
}

impl DietFoodFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip,
            limit,
            search: None,
            food_type: None,
        }
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_food_type(mut self, food_type: impl Into<String>) -> Self {
        self.food_type = Some(food_type.into());
        self
    }

    fn push_conditions(&self, query: &mut QueryBuilder<'_, Postgres>) {
        if let Some(ref search) = self.search {
            query.push(" AND LOWER(name) LIKE ");
            query.push_bind(contains_pattern(search));
            query.push(" ESCAPE '\\'");
        }
        if let Some(ref food_type) = self.food_type {
            query.push(" AND LOWER(food_type) LIKE ");
            query.push_bind(contains_pattern(food_type));
            query.push(" ESCAPE '\\'");
        }
    }
}

pub struct DietFoods<'c> {
    db: &'c mut PgConnection,
}

impl<'c> DietFoods<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Number of foods matching the filter, ignoring `skip` and `limit`
    #[instrument(skip(self, filter), err)]
    pub async fn count(&mut self, filter: &DietFoodFilter) -> Result<i64> {
        let mut query: QueryBuilder<Postgres> = QueryBuilder::new("SELECT COUNT(*) FROM diet_foods WHERE 1=1");
        filter.push_conditions(&mut query);

        let count: i64 = query.build_query_scalar().fetch_one(&mut *self.db).await?;

        Ok(count)
    }

    /// Distinct food types in use, alphabetically
    #[instrument(skip(self), err)]
    pub async fn food_types(&mut self) -> Result<Vec<String>> {
        let types = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT food_type FROM diet_foods WHERE food_type IS NOT NULL ORDER BY food_type",
        )
        .fetch_all(&mut *self.db)
        .await?;

        Ok(types)
    }
}

#[async_trait::async_trait]
impl<'c> Repository for DietFoods<'c> {
    type CreateRequest = DietFoodCreateDBRequest;
    type UpdateRequest = DietFoodUpdateDBRequest;
    type Response = DietFoodDBResponse;
    type Id = FoodId;
    type Filter = DietFoodFilter;

    #[instrument(skip(self, request), fields(name = %request.name), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let food = sqlx::query_as::<_, DietFoodDBResponse>(
            r#"
            INSERT INTO diet_foods (name, calories, protein, fat, carbohydrates, water, food_type)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(&request.name)
        .bind(request.calories)
        .bind(request.protein)
        .bind(request.fat)
        .bind(request.carbohydrates)
        .bind(request.water)
        .bind(&request.food_type)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(food)
    }

    #[instrument(skip(self), fields(food_id = %id), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let food = sqlx::query_as::<_, DietFoodDBResponse>("SELECT * FROM diet_foods WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(food)
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    async fn get_bulk(&mut self, ids: Vec<FoodId>) -> Result<HashMap<FoodId, DietFoodDBResponse>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let foods = sqlx::query_as::<_, DietFoodDBResponse>("SELECT * FROM diet_foods WHERE id = ANY($1)")
            .bind(raw_ids(&ids))
            .fetch_all(&mut *self.db)
            .await?;

        Ok(foods.into_iter().map(|food| (food.id, food)).collect())
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query: QueryBuilder<Postgres> = QueryBuilder::new("SELECT * FROM diet_foods WHERE 1=1");
        filter.push_conditions(&mut query);

        query.push(" ORDER BY name, id LIMIT ");
        query.push_bind(filter.limit);
        query.push(" OFFSET ");
        query.push_bind(filter.skip);

        let foods = query.build_query_as::<DietFoodDBResponse>().fetch_all(&mut *self.db).await?;

        tracing::debug!("Retrieved {} foods", foods.len());

        Ok(foods)
    }

    /// A food still referenced by a diet record cannot be deleted and fails with
    /// [`DbError::ForeignKeyViolation`].
    #[instrument(skip(self), fields(food_id = %id), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM diet_foods WHERE id = $1").bind(id).execute(&mut *self.db).await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(food_id = %id), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let food = sqlx::query_as::<_, DietFoodDBResponse>(
            r#"
            UPDATE diet_foods SET
                name = COALESCE($2, name),
                calories = COALESCE($3, calories),
                protein = COALESCE($4, protein),
                fat = COALESCE($5, fat),
                carbohydrates = COALESCE($6, carbohydrates),
                water = COALESCE($7, water),
                food_type = COALESCE($8, food_type),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.name)
        .bind(request.calories)
        .bind(request.protein)
        .bind(request.fat)
        .bind(request.carbohydrates)
        .bind(request.water)
        .bind(&request.food_type)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(food)
    }
}

#[cfg(all(test, feature = "postgres-tests"))]
mod tests {
    use super::*;
    use crate::test_utils::{create_diet_record, create_test_user};
    use crate::db::handlers::associations::{Associations, LinkStore};
    use crate::db::models::associations::{AssociationLink, DietRecordFoods};
    use rust_decimal::Decimal;
    use sqlx::PgPool;

    fn rice() -> DietFoodCreateDBRequest {
        DietFoodCreateDBRequest::builder()
            .name("Rice")
            .calories(Decimal::new(130, 0))
            .protein(Decimal::new(27, 1))
            .carbohydrates(Decimal::new(28, 0))
            .food_type("grain")
            .build()
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_and_get_food(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = DietFoods::new(&mut conn);

        let created = repo.create(&rice()).await.unwrap();
        assert_eq!(created.name, "Rice");
        assert_eq!(created.calories, Decimal::new(130, 0));
        assert_eq!(created.fat, None);
        assert_eq!(created.food_type.as_deref(), Some("grain"));

        let fetched = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched, created);
        assert!(repo.get_by_id(FoodId(999_999)).await.unwrap().is_none());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_only_touches_given_fields(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = DietFoods::new(&mut conn);
        let created = repo.create(&rice()).await.unwrap();

        let update = DietFoodUpdateDBRequest {
            fat: Some(Decimal::new(3, 1)),
            ..Default::default()
        };
        let updated = repo.update(created.id, &update).await.unwrap();

        assert_eq!(updated.fat, Some(Decimal::new(3, 1)));
        assert_eq!(updated.name, created.name);
        assert_eq!(updated.calories, created.calories);
        assert_eq!(updated.protein, created.protein);

        let missing = repo.update(FoodId(999_999), &update).await;
        assert!(matches!(missing, Err(DbError::NotFound)));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_with_search_and_bulk_get(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = DietFoods::new(&mut conn);

        let rice = repo.create(&rice()).await.unwrap();
        let brown = repo
            .create(&DietFoodCreateDBRequest::builder().name("Brown Rice").calories(Decimal::new(111, 0)).build())
            .await
            .unwrap();
        let egg = repo
            .create(&DietFoodCreateDBRequest::builder().name("Egg").calories(Decimal::new(155, 0)).build())
            .await
            .unwrap();

        let all = repo.list(&DietFoodFilter::new(0, 10)).await.unwrap();
        assert_eq!(all.iter().map(|f| f.name.as_str()).collect::<Vec<_>>(), vec!["Brown Rice", "Egg", "Rice"]);

        let matching = repo.list(&DietFoodFilter::new(0, 10).with_search("RICE")).await.unwrap();
        assert_eq!(matching.len(), 2);

        let second_page = repo.list(&DietFoodFilter::new(1, 1)).await.unwrap();
        assert_eq!(second_page[0].id, egg.id);

        assert_eq!(repo.count(&DietFoodFilter::new(0, 1)).await.unwrap(), 3);
        assert_eq!(repo.count(&DietFoodFilter::new(0, 1).with_search("rice")).await.unwrap(), 2);

        let bulk = repo.get_bulk(vec![rice.id, brown.id, FoodId(999_999)]).await.unwrap();
        assert_eq!(bulk.len(), 2);
        assert!(bulk.contains_key(&rice.id) && bulk.contains_key(&brown.id));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_search_matches_wildcards_literally(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = DietFoods::new(&mut conn);

        repo.create(&rice()).await.unwrap();
        repo.create(&DietFoodCreateDBRequest::builder().name("Milk 2%").calories(Decimal::new(50, 0)).build())
            .await
            .unwrap();
        repo.create(&DietFoodCreateDBRequest::builder().name("Soy_Milk").calories(Decimal::new(54, 0)).build())
            .await
            .unwrap();

        let percent = repo.list(&DietFoodFilter::new(0, 10).with_search("%")).await.unwrap();
        assert_eq!(percent.iter().map(|f| f.name.as_str()).collect::<Vec<_>>(), vec!["Milk 2%"]);
        assert_eq!(repo.count(&DietFoodFilter::new(0, 10).with_search("%")).await.unwrap(), 1);

        let underscore = repo.list(&DietFoodFilter::new(0, 10).with_search("_")).await.unwrap();
        assert_eq!(underscore.iter().map(|f| f.name.as_str()).collect::<Vec<_>>(), vec!["Soy_Milk"]);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_food_type_filter_and_distinct_types(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = DietFoods::new(&mut conn);

        repo.create(&rice()).await.unwrap();
        repo.create(
            &DietFoodCreateDBRequest::builder()
                .name("Oats")
                .calories(Decimal::new(389, 0))
                .food_type("grain")
                .build(),
        )
        .await
        .unwrap();
        repo.create(
            &DietFoodCreateDBRequest::builder()
                .name("Apple")
                .calories(Decimal::new(52, 0))
                .food_type("fruit")
                .build(),
        )
        .await
        .unwrap();
        repo.create(&DietFoodCreateDBRequest::builder().name("Mystery").calories(Decimal::ONE).build())
            .await
            .unwrap();

        assert_eq!(repo.food_types().await.unwrap(), vec!["fruit".to_string(), "grain".to_string()]);

        let grains = repo.list(&DietFoodFilter::new(0, 10).with_food_type("GRAIN")).await.unwrap();
        assert_eq!(grains.iter().map(|f| f.name.as_str()).collect::<Vec<_>>(), vec!["Oats", "Rice"]);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_delete_referenced_food_is_restricted(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let user = create_test_user(&mut conn, "restrict").await;
        let record = create_diet_record(&mut conn, user).await;

        let food = DietFoods::new(&mut conn).create(&rice()).await.unwrap();
        let unused = DietFoods::new(&mut conn)
            .create(&DietFoodCreateDBRequest::builder().name("Apple").calories(Decimal::new(52, 0)).build())
            .await
            .unwrap();

        Associations::<DietRecordFoods>::new(&mut conn)
            .insert_links(&[AssociationLink::new(record, food.id, Decimal::new(100, 0))])
            .await
            .unwrap();

        let mut repo = DietFoods::new(&mut conn);
        assert!(matches!(repo.delete(food.id).await, Err(DbError::ForeignKeyViolation { .. })));
        assert!(repo.delete(unused.id).await.unwrap());
        assert!(!repo.delete(unused.id).await.unwrap());
    }
}
