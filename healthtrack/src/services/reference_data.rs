//! Paginated browsing of the food and exercise type catalogues.

use sqlx::PgPool;
use tracing::{debug, instrument};

use crate::api::models::{
    diet_foods::{DietFoodResponse, ListDietFoodsQuery},
    exercise_types::{ExerciseTypeSummary, ListExerciseTypesQuery},
    pagination::PageResponse,
};
use crate::config::PaginationConfig;
use crate::db::handlers::{
    Repository,
    diet_foods::{DietFoodFilter, DietFoods},
    exercise_types::{ExerciseTypeFilter, ExerciseTypes},
};
use crate::errors::{Error, Result};

/// `None` for a missing or blank filter value, otherwise the trimmed value
fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

pub struct ReferenceDataService {
    db: PgPool,
    pagination: PaginationConfig,
}

impl ReferenceDataService {
    pub fn new(db: PgPool, pagination: PaginationConfig) -> Self {
        Self { db, pagination }
    }

    #[instrument(skip_all, err)]
    pub async fn list_foods(&self, query: ListDietFoodsQuery) -> Result<PageResponse<DietFoodResponse>> {
        let page = query.page.resolve(&self.pagination)?;

        let mut filter = DietFoodFilter::new(page.offset(), page.limit());
        if let Some(name) = non_blank(query.name.as_deref()) {
            filter = filter.with_search(name);
        }
        if let Some(food_type) = non_blank(query.food_type.as_deref()) {
            filter = filter.with_food_type(food_type);
        }

        let mut conn = self.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
        let mut repo = DietFoods::new(&mut conn);

        let total = repo.count(&filter).await?;
        if total < 1 {
            debug!("No matching foods");
            return Ok(PageResponse::empty());
        }

        let foods = repo.list(&filter).await?;
        Ok(PageResponse::new(page, total, foods.into_iter().map(Into::into).collect()))
    }

    /// Every distinct food type currently in use
    #[instrument(skip_all, err)]
    pub async fn food_types(&self) -> Result<Vec<String>> {
        let mut conn = self.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
        Ok(DietFoods::new(&mut conn).food_types().await?)
    }

    #[instrument(skip_all, err)]
    pub async fn list_exercise_types(&self, query: ListExerciseTypesQuery) -> Result<PageResponse<ExerciseTypeSummary>> {
        let page = query.page.resolve(&self.pagination)?;

        let mut filter = ExerciseTypeFilter::new(page.offset(), page.limit());
        if let Some(name) = non_blank(query.name.as_deref()) {
            filter = filter.with_search(name);
        }

        let mut conn = self.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
        let mut repo = ExerciseTypes::new(&mut conn);

        let total = repo.count(&filter).await?;
        if total < 1 {
            debug!("No matching exercise types");
            return Ok(PageResponse::empty());
        }

        let types = repo.list(&filter).await?;
        Ok(PageResponse::new(page, total, types.into_iter().map(Into::into).collect()))
    }
}


#[cfg(all(test, feature = "postgres-tests"))]
mod postgres_tests {
    use super::*;
    use crate::api::models::pagination::PageRequest;
    use crate::db::models::diet_foods::DietFoodCreateDBRequest;
    use crate::test_utils::{create_exercise_type, create_food};
    use rust_decimal::Decimal;

    #[sqlx::test]
    #[test_log::test]
    async fn test_foods_are_listed_in_page_envelope(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        for name in ["Apple", "Banana", "Cherry"] {
            create_food(&mut conn, name).await;
        }
        DietFoods::new(&mut conn)
            .create(
                &DietFoodCreateDBRequest::builder()
                    .name("Dates")
                    .calories(Decimal::new(282, 0))
                    .food_type("fruit")
                    .build(),
            )
            .await
            .unwrap();
        drop(conn);

        let service = ReferenceDataService::new(pool.clone(), PaginationConfig::default());

        let first = service
            .list_foods(ListDietFoodsQuery {
                page: PageRequest::new(1, 3),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(first.total, 4);
        assert_eq!(first.pages, 2);
        assert!(first.has_next);
        assert_eq!(first.data_list.iter().map(|f| f.name.as_str()).collect::<Vec<_>>(), vec!["Apple", "Banana", "Cherry"]);

        let second = service
            .list_foods(ListDietFoodsQuery {
                page: PageRequest::new(2, 3),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(second.has_previous);
        assert!(!second.has_next);
        assert_eq!(second.data_list.len(), 1);

        let fruit = service
            .list_foods(ListDietFoodsQuery {
                page: PageRequest::new(1, 10),
                name: Some("  ".to_string()),
                food_type: Some("fruit".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(fruit.total, 1);
        assert_eq!(fruit.data_list[0].name, "Dates");

        let nothing = service
            .list_foods(ListDietFoodsQuery {
                page: PageRequest::new(1, 10),
                name: Some("%".to_string()),
                food_type: None,
            })
            .await
            .unwrap();
        assert_eq!(nothing, PageResponse::empty());

        assert_eq!(service.food_types().await.unwrap(), vec!["fruit".to_string()]);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_exercise_types_are_listed_in_page_envelope(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        for name in ["Cycling", "Running", "Rowing"] {
            create_exercise_type(&mut conn, name).await;
        }
        drop(conn);

        let service = ReferenceDataService::new(pool.clone(), PaginationConfig::default());
        let page = service
            .list_exercise_types(ListExerciseTypesQuery {
                page: PageRequest::new(1, 2),
                name: Some("r".to_string()),
            })
            .await
            .unwrap();

        // "r" matches Running and Rowing; Cycling has no r
        assert_eq!(page.total, 2);
        assert_eq!(page.pages, 1);
        assert_eq!(page.data_list.iter().map(|t| t.name.as_str()).collect::<Vec<_>>(), vec!["Rowing", "Running"]);
    }
}
