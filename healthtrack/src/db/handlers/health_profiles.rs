//! Database repository for health profiles, addressed by owning user.

use sqlx::PgConnection;
use tracing::instrument;

use crate::db::{
    errors::{DbError, Result},
    models::health_profiles::{HealthProfileCreateDBRequest, HealthProfileDBResponse, HealthProfileUpdateDBRequest},
};
use crate::types::UserId;

/// Unique constraint enforcing one profile per user
pub const USER_UNIQUE_CONSTRAINT: &str = "health_profiles_user_unique";

pub struct HealthProfiles<'c> {
    db: &'c mut PgConnection,
}

impl<'c> HealthProfiles<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// A second profile for the same user fails with [`DbError::UniqueViolation`] on
    /// [`USER_UNIQUE_CONSTRAINT`].
    #[instrument(skip(self, request), fields(user_id = %request.user_id), err)]
    pub async fn create(&mut self, request: &HealthProfileCreateDBRequest) -> Result<HealthProfileDBResponse> {
        let profile = sqlx::query_as::<_, HealthProfileDBResponse>(
            r#"
            INSERT INTO health_profiles (user_id, medical_history, allergy_history, exercise_habits, health_goals)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(request.user_id)
        .bind(&request.medical_history)
        .bind(&request.allergy_history)
        .bind(&request.exercise_habits)
        .bind(&request.health_goals)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(profile)
    }

    #[instrument(skip(self), fields(user_id = %user_id), err)]
    pub async fn get_by_user(&mut self, user_id: UserId) -> Result<Option<HealthProfileDBResponse>> {
        let profile = sqlx::query_as::<_, HealthProfileDBResponse>("SELECT * FROM health_profiles WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(profile)
    }

    #[instrument(skip(self, request), fields(user_id = %user_id), err)]
    pub async fn update_by_user(&mut self, user_id: UserId, request: &HealthProfileUpdateDBRequest) -> Result<HealthProfileDBResponse> {
        let profile = sqlx::query_as::<_, HealthProfileDBResponse>(
            r#"
            UPDATE health_profiles SET
                medical_history = COALESCE($2, medical_history),
                allergy_history = COALESCE($3, allergy_history),
                exercise_habits = COALESCE($4, exercise_habits),
                health_goals = COALESCE($5, health_goals),
                updated_at = NOW()
            WHERE user_id = $1
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(&request.medical_history)
        .bind(&request.allergy_history)
        .bind(&request.exercise_habits)
        .bind(&request.health_goals)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(profile)
    }

    #[instrument(skip(self), fields(user_id = %user_id), err)]
    pub async fn delete_by_user(&mut self, user_id: UserId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM health_profiles WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
