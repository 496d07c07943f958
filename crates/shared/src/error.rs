//! Error types for the record store

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Not authorized")]
    NotAuthorized,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("Database error: {:?}", err);
        match err {
            sqlx::Error::Database(db_err) => {
                // PostgreSQL unique violation
                if db_err.code().as_deref() == Some("23505") {
                    return StoreError::Conflict("Resource already exists".to_string());
                }
                StoreError::Database(db_err.to_string())
            }
            _ => StoreError::Database(err.to_string()),
        }
    }
}

/// Result type alias for record store operations
pub type StoreResult<T> = Result<T, StoreError>;
