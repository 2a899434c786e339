//! Fixtures shared by unit and Postgres-backed tests.

use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool, postgres::PgPoolOptions};

use crate::db::handlers::{DietFoods, DietRecords, ExerciseRecords, ExerciseTypes, HealthGoals, Repository, Users};
use crate::db::models::{
    diet_foods::DietFoodCreateDBRequest, diet_records::DietRecordCreateDBRequest, exercise_records::ExerciseRecordCreateDBRequest,
    exercise_types::ExerciseTypeCreateDBRequest, health_goals::HealthGoalCreateDBRequest, users::UserCreateDBRequest,
};
use crate::types::{DietRecordId, ExerciseRecordId, ExerciseTypeId, FoodId, HealthGoalId, UserId};

/// A pool that never connects, for service tests that fail before reaching the store
pub fn lazy_pool() -> PgPool {
    PgPoolOptions::new()
        .connect_lazy("postgres://healthtrack@localhost/healthtrack_unused")
        .expect("Failed to build lazy pool")
}

async fn create_user(conn: &mut PgConnection, username: &str, height: Option<Decimal>) -> UserId {
    Users::new(conn)
        .create(&UserCreateDBRequest {
            username: username.to_string(),
            height,
            weight: None,
        })
        .await
        .expect("Failed to create test user")
        .id
}

/// A user without a recorded height
pub async fn create_test_user(conn: &mut PgConnection, username: &str) -> UserId {
    create_user(conn, username, None).await
}

pub async fn create_user_with_height(conn: &mut PgConnection, username: &str, height_cm: Decimal) -> UserId {
    create_user(conn, username, Some(height_cm)).await
}

pub async fn create_food_with(conn: &mut PgConnection, name: &str, calories: Decimal) -> FoodId {
    DietFoods::new(conn)
        .create(&DietFoodCreateDBRequest::builder().name(name).calories(calories).build())
        .await
        .expect("Failed to create test food")
        .id
}

pub async fn create_food(conn: &mut PgConnection, name: &str) -> FoodId {
    create_food_with(conn, name, Decimal::ONE_HUNDRED).await
}

pub async fn create_exercise_type(conn: &mut PgConnection, name: &str) -> ExerciseTypeId {
    ExerciseTypes::new(conn)
        .create(&ExerciseTypeCreateDBRequest { name: name.to_string() })
        .await
        .expect("Failed to create test exercise type")
        .id
}

pub async fn create_diet_record(conn: &mut PgConnection, user_id: UserId) -> DietRecordId {
    let request = DietRecordCreateDBRequest::builder()
        .user_id(user_id)
        .meal_type("lunch")
        .meal_time(Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap())
        .build();

    DietRecords::new(conn).create(&request).await.expect("Failed to create test diet record").id
}

pub async fn create_exercise_record(conn: &mut PgConnection, user_id: UserId) -> ExerciseRecordId {
    let request = ExerciseRecordCreateDBRequest::builder()
        .user_id(user_id)
        .duration(30)
        .exercise_date(Utc.with_ymd_and_hms(2025, 3, 1, 7, 0, 0).unwrap())
        .build();

    ExerciseRecords::new(conn)
        .create(&request)
        .await
        .expect("Failed to create test exercise record")
        .id
}

pub async fn create_health_goal(conn: &mut PgConnection, user_id: UserId) -> HealthGoalId {
    let request = HealthGoalCreateDBRequest::builder()
        .user_id(user_id)
        .target_plan("Run a half marathon")
        .target_date(Utc.with_ymd_and_hms(2025, 10, 1, 0, 0, 0).unwrap())
        .build();

    HealthGoals::new(conn).create(&request).await.expect("Failed to create test health goal").id
}
