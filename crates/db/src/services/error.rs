use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Stored workflow frequency is invalid: {0}")]
    InvalidFrequency(#[from] engine::UnknownFrequency),

    #[error("Stored workflow filter is invalid: {0}")]
    InvalidFilter(#[from] serde_json::Error),
}
