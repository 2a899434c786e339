use crate::db::errors::DbError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Invalid request data: missing required ids, blank fields, malformed batches
    #[error("{message}")]
    BadRequest { message: String },

    /// Missing or out-of-range page parameters
    #[error("Invalid page parameter: {message}")]
    InvalidPageParameter { message: String },

    /// Requested resource not found
    #[error("{resource} with ID {id} not found")]
    NotFound { resource: String, id: String },

    /// Inserting association links did not store every requested link
    #[error("Failed to save {association} links: expected {expected}, inserted {inserted}")]
    AssociationSaveFailure {
        association: &'static str,
        expected: usize,
        inserted: u64,
        #[source]
        source: Option<DbError>,
    },

    /// Removing the previous association links failed; nothing was inserted
    #[error("Failed to delete {association} links")]
    AssociationDeleteFailure {
        association: &'static str,
        #[source]
        source: DbError,
    },

    /// Height or weight was zero or negative
    #[error("Invalid body measurement: {message}")]
    InvalidBodyMeasurement { message: String },

    /// The owning user has no usable height on record, so BMI cannot be derived
    #[error("User {user_id} has no height recorded")]
    UserHeightMissing { user_id: String },

    /// An aggregation request lacks an input it cannot be computed without
    #[error("Aggregation input missing: {field}")]
    AggregationInputMissing { field: &'static str },

    /// A user may keep only one health profile
    #[error("User {user_id} already has a health profile")]
    HealthProfileExists { user_id: String },

    /// A weighted sum left the representable decimal range
    #[error("Aggregation overflowed while totalling {dimension}")]
    AggregationOverflow { dimension: String },

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },

    /// Database operation error
    #[error(transparent)]
    Database(#[from] DbError),

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::BadRequest { .. }
            | Error::InvalidPageParameter { .. }
            | Error::InvalidBodyMeasurement { .. }
            | Error::UserHeightMissing { .. }
            | Error::AggregationInputMissing { .. } => StatusCode::BAD_REQUEST,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::HealthProfileExists { .. } => StatusCode::CONFLICT,
            Error::AggregationOverflow { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Error::AssociationSaveFailure { .. } | Error::AssociationDeleteFailure { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Database(db_err) => match db_err {
                DbError::NotFound => StatusCode::NOT_FOUND,
                DbError::UniqueViolation { .. } => StatusCode::CONFLICT,
                DbError::ForeignKeyViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::CheckViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code. Clients branch on this rather than on the message.
    pub fn code(&self) -> &'static str {
        match self {
            Error::BadRequest { .. } => "VALIDATION_ERROR",
            Error::InvalidPageParameter { .. } => "INVALID_PAGE_PARAMETER",
            Error::NotFound { .. } => "NOT_FOUND",
            Error::AssociationSaveFailure { .. } => "ASSOCIATION_SAVE_FAILED",
            Error::AssociationDeleteFailure { .. } => "ASSOCIATION_DELETE_FAILED",
            Error::InvalidBodyMeasurement { .. } => "INVALID_BODY_MEASUREMENT",
            Error::UserHeightMissing { .. } => "USER_HEIGHT_MISSING",
            Error::AggregationInputMissing { .. } => "AGGREGATION_INPUT_MISSING",
            Error::AggregationOverflow { .. } => "AGGREGATION_OVERFLOW",
            Error::HealthProfileExists { .. } => "HEALTH_PROFILE_EXISTS",
            Error::Internal { .. } | Error::Other(_) => "INTERNAL_ERROR",
            Error::Database(db_err) => match db_err {
                DbError::NotFound => "NOT_FOUND",
                DbError::UniqueViolation { .. } => "CONFLICT",
                DbError::ForeignKeyViolation { .. } => "INVALID_REFERENCE",
                DbError::CheckViolation { .. } => "INVALID_DATA",
                DbError::Other(_) => "DATABASE_ERROR",
            },
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            Error::BadRequest { message } => message.clone(),
            Error::InvalidPageParameter { message } => format!("Invalid page parameter: {message}"),
            Error::NotFound { resource, id } => format!("{resource} with ID {id} not found"),
            Error::AssociationSaveFailure { association, .. } => format!("Failed to save {association} links"),
            Error::AssociationDeleteFailure { association, .. } => format!("Failed to delete {association} links"),
            Error::InvalidBodyMeasurement { message } => format!("Invalid body measurement: {message}"),
            Error::UserHeightMissing { .. } => "Height must be recorded before body measurements can be added".to_string(),
            Error::AggregationInputMissing { field } => format!("Missing required field: {field}"),
            Error::AggregationOverflow { dimension } => format!("The {dimension} total is too large to compute"),
            Error::HealthProfileExists { .. } => "Only one health profile is allowed per user".to_string(),
            Error::Internal { .. } => "Internal server error".to_string(),
            Error::Database(db_err) => match db_err {
                DbError::NotFound => "Resource not found".to_string(),
                DbError::UniqueViolation { table, .. } => match table.as_deref() {
                    Some("exercise_types") => "An exercise type with this name already exists".to_string(),
                    Some("users") => "This username is already taken".to_string(),
                    Some("health_profiles") => "Only one health profile is allowed per user".to_string(),
                    _ => "Resource already exists".to_string(),
                },
                DbError::ForeignKeyViolation { .. } => "Invalid reference to related resource".to_string(),
                DbError::CheckViolation { .. } => "Invalid data provided".to_string(),
                DbError::Other(_) => "Database error occurred".to_string(),
            },
            Error::Other(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log full error details for debugging - different log levels based on severity
        match &self {
            Error::Database(DbError::Other(_))
            | Error::Internal { .. }
            | Error::Other(_)
            | Error::AssociationSaveFailure { .. }
            | Error::AssociationDeleteFailure { .. } => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::Database(_) => {
                tracing::warn!("Database constraint error: {}", self);
            }
            Error::BadRequest { .. }
            | Error::InvalidPageParameter { .. }
            | Error::NotFound { .. }
            | Error::InvalidBodyMeasurement { .. }
            | Error::UserHeightMissing { .. }
            | Error::AggregationInputMissing { .. }
            | Error::AggregationOverflow { .. }
            | Error::HealthProfileExists { .. } => {
                tracing::debug!("Client error: {}", self);
            }
        }

        let body = json!({
            "code": self.code(),
            "message": self.user_message(),
        });

        (self.status_code(), Json(body)).into_response()
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn association_failures_have_distinct_codes() {
        let save = Error::AssociationSaveFailure {
            association: "diet_records_foods",
            expected: 2,
            inserted: 1,
            source: None,
        };
        let delete = Error::AssociationDeleteFailure {
            association: "diet_records_foods",
            source: DbError::Other(anyhow::anyhow!("connection reset")),
        };

        assert_eq!(save.code(), "ASSOCIATION_SAVE_FAILED");
        assert_eq!(delete.code(), "ASSOCIATION_DELETE_FAILED");
        assert_eq!(save.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(delete.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        // internals stay out of the user-facing message
        assert!(!delete.user_message().contains("connection reset"));
    }

    #[test]
    fn validation_errors_are_client_errors() {
        let errors = [
            Error::InvalidPageParameter {
                message: "current must be at least 1".to_string(),
            },
            Error::InvalidBodyMeasurement {
                message: "height must be positive".to_string(),
            },
            Error::AggregationInputMissing { field: "user_id" },
            Error::UserHeightMissing { user_id: "7".to_string() },
        ];

        for error in errors {
            assert_eq!(error.status_code(), StatusCode::BAD_REQUEST, "{error}");
        }
    }

    #[test]
    fn second_health_profile_is_a_conflict() {
        let error = Error::HealthProfileExists { user_id: "4".to_string() };
        assert_eq!(error.status_code(), StatusCode::CONFLICT);
        assert_eq!(error.code(), "HEALTH_PROFILE_EXISTS");

        let overflow = Error::AggregationOverflow {
            dimension: "calories".to_string(),
        };
        assert_eq!(overflow.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(overflow.code(), "AGGREGATION_OVERFLOW");
    }

    #[test]
    fn database_not_found_maps_to_404() {
        let error = Error::from(DbError::NotFound);
        assert_eq!(error.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(error.code(), "NOT_FOUND");
    }

    #[test]
    fn into_response_uses_status_code() {
        let response = Error::NotFound {
            resource: "Diet record".to_string(),
            id: "12".to_string(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
