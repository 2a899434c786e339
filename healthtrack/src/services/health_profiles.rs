//! Per-user health profiles. A user keeps at most one.

use sqlx::PgPool;
use tracing::{info, instrument};

use crate::api::models::health_profiles::{HealthProfileCreate, HealthProfileResponse, HealthProfileUpdate};
use crate::db::{
    errors::DbError,
    handlers::health_profiles::{HealthProfiles, USER_UNIQUE_CONSTRAINT},
    models::health_profiles::{HealthProfileCreateDBRequest, HealthProfileUpdateDBRequest},
};
use crate::errors::{Error, Result};
use crate::types::UserId;

const RESOURCE: &str = "Health profile of user";

fn not_found(user_id: UserId) -> Error {
    Error::NotFound {
        resource: RESOURCE.to_string(),
        id: user_id.to_string(),
    }
}

/// Map insert failures onto the profile's own errors
fn create_error(user_id: UserId) -> impl FnOnce(DbError) -> Error {
    move |error| match error {
        DbError::UniqueViolation { ref constraint, .. } if constraint.as_deref() == Some(USER_UNIQUE_CONSTRAINT) => Error::HealthProfileExists {
            user_id: user_id.to_string(),
        },
        DbError::ForeignKeyViolation { .. } => Error::NotFound {
            resource: "User".to_string(),
            id: user_id.to_string(),
        },
        other => Error::Database(other),
    }
}

pub struct HealthProfilesService {
    db: PgPool,
}

impl HealthProfilesService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Open the profile of `request.user_id`; a second profile is [`Error::HealthProfileExists`].
    #[instrument(skip_all, fields(user_id = %request.user_id), err)]
    pub async fn create(&self, request: HealthProfileCreate) -> Result<HealthProfileResponse> {
        let mut tx = self.db.begin().await.map_err(|e| Error::Database(e.into()))?;

        let mut repo = HealthProfiles::new(&mut tx);
        if repo.get_by_user(request.user_id).await?.is_some() {
            return Err(Error::HealthProfileExists {
                user_id: request.user_id.to_string(),
            });
        }
        // the unique constraint still decides between two concurrent creates
        let profile = repo
            .create(&HealthProfileCreateDBRequest::from(&request))
            .await
            .map_err(create_error(request.user_id))?;

        tx.commit().await.map_err(|e| Error::Database(e.into()))?;

        info!(profile_id = %profile.id, "Created health profile");
        Ok(profile.into())
    }

    #[instrument(skip(self), err)]
    pub async fn get_by_user(&self, user_id: UserId) -> Result<HealthProfileResponse> {
        let mut conn = self.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
        let profile = HealthProfiles::new(&mut conn)
            .get_by_user(user_id)
            .await?
            .ok_or_else(|| not_found(user_id))?;

        Ok(profile.into())
    }

    #[instrument(skip_all, fields(user_id = %request.user_id), err)]
    pub async fn update(&self, request: HealthProfileUpdate) -> Result<HealthProfileResponse> {
        let mut conn = self.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
        let profile = HealthProfiles::new(&mut conn)
            .update_by_user(request.user_id, &HealthProfileUpdateDBRequest::from(&request))
            .await
            .map_err(|error| match error {
                DbError::NotFound => not_found(request.user_id),
                other => Error::Database(other),
            })?;

        info!(profile_id = %profile.id, "Updated health profile");
        Ok(profile.into())
    }

    #[instrument(skip(self), err)]
    pub async fn delete_by_user(&self, user_id: UserId) -> Result<()> {
        let mut conn = self.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
        if !HealthProfiles::new(&mut conn).delete_by_user(user_id).await? {
            return Err(not_found(user_id));
        }

        info!("Deleted health profile");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unique_violation(constraint: &str) -> DbError {
        DbError::UniqueViolation {
            constraint: Some(constraint.to_string()),
            table: Some("health_profiles".to_string()),
            message: "duplicate key value violates unique constraint".to_string(),
        }
    }

    #[test]
    fn insert_errors_map_to_profile_errors() {
        let user = UserId(3);

        assert!(matches!(
            create_error(user)(unique_violation(USER_UNIQUE_CONSTRAINT)),
            Error::HealthProfileExists { .. }
        ));
        assert!(matches!(
            create_error(user)(unique_violation("health_profiles_pkey")),
            Error::Database(DbError::UniqueViolation { .. })
        ));

        let missing_user = DbError::ForeignKeyViolation {
            constraint: Some("health_profiles_user_id_fkey".to_string()),
            table: Some("health_profiles".to_string()),
            message: "insert or update violates foreign key constraint".to_string(),
        };
        match create_error(user)(missing_user) {
            Error::NotFound { resource, id } => {
                assert_eq!(resource, "User");
                assert_eq!(id, "3");
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}

#[cfg(all(test, feature = "postgres-tests"))]
mod postgres_tests {
    use super::*;
    use crate::test_utils::create_test_user;

    fn create_request(user_id: UserId) -> HealthProfileCreate {
        HealthProfileCreate {
            user_id,
            medical_history: None,
            allergy_history: Some("Pollen".to_string()),
            exercise_habits: Some("Morning runs".to_string()),
            health_goals: Some("Run 10 km".to_string()),
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_second_profile_for_user_is_rejected(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let user = create_test_user(&mut conn, "single_profile").await;
        drop(conn);

        let service = HealthProfilesService::new(pool.clone());
        let first = service.create(create_request(user)).await.unwrap();

        let second = service.create(create_request(user)).await;
        assert!(matches!(second, Err(Error::HealthProfileExists { .. })));

        // the original profile is untouched
        assert_eq!(service.get_by_user(user).await.unwrap(), first);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_profile_lifecycle(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let user = create_test_user(&mut conn, "lifecycle").await;
        drop(conn);

        let service = HealthProfilesService::new(pool.clone());
        assert!(matches!(service.get_by_user(user).await, Err(Error::NotFound { .. })));

        service.create(create_request(user)).await.unwrap();
        let updated = service
            .update(HealthProfileUpdate {
                user_id: user,
                medical_history: Some("None known".to_string()),
                allergy_history: None,
                exercise_habits: None,
                health_goals: None,
            })
            .await
            .unwrap();
        assert_eq!(updated.medical_history.as_deref(), Some("None known"));
        assert_eq!(updated.allergy_history.as_deref(), Some("Pollen"));

        service.delete_by_user(user).await.unwrap();
        assert!(matches!(service.delete_by_user(user).await, Err(Error::NotFound { .. })));
        assert!(matches!(service.get_by_user(user).await, Err(Error::NotFound { .. })));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_unknown_user_cannot_open_profile(pool: PgPool) {
        let service = HealthProfilesService::new(pool.clone());
        let result = service.create(create_request(UserId(999_999))).await;
        assert!(matches!(result, Err(Error::NotFound { .. })));
    }
}
