//! Database repository for users.

use sqlx::PgConnection;
use tracing::instrument;

use crate::db::{
    errors::Result,
    models::users::{UserCreateDBRequest, UserDBResponse},
};
use crate::types::UserId;

pub struct Users<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Users<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(username = %request.username), err)]
    pub async fn create(&mut self, request: &UserCreateDBRequest) -> Result<UserDBResponse> {
        let user = sqlx::query_as::<_, UserDBResponse>("INSERT INTO users (username, height, weight) VALUES ($1, $2, $3) RETURNING *")
            .bind(&request.username)
            .bind(request.height)
            .bind(request.weight)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(user)
    }

    #[instrument(skip(self), fields(user_id = %id), err)]
    pub async fn get_by_id(&mut self, id: UserId) -> Result<Option<UserDBResponse>> {
        let user = sqlx::query_as::<_, UserDBResponse>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(user)
    }
}
