//! Error types shared by the storage adapters and the service layer.

/// Failures raised by a [`crate::storage::RestaurantStore`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Failures surfaced to callers of the restaurant service.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Storage failure: {0}")]
    Storage(#[source] StoreError),
}

impl ServiceError {
    /// Maps a store error for a lookup of `what`; a missing row becomes `NotFound`.
    pub fn from_lookup(what: impl Into<String>, err: StoreError) -> Self {
        match err {
            StoreError::NotFound => ServiceError::NotFound(what.into()),
            other => ServiceError::Storage(other),
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        ServiceError::Storage(err)
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;
