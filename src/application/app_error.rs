use pitchnode_types::ValidationError;
use thiserror::Error;

pub use pitchnode_types::ErrorCode;

#[derive(Error, Debug)]
pub enum AppError {
    /// The record store rejected the request. The message is shown to the user.
    #[error("Storage error: {0}")]
    Storage(String),

    /// The record store could not be reached.
    #[error("Network error: {0}")]
    Network(String),

    #[error("Too many requests. Please slow down.")]
    RateLimited,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found")]
    NotFound,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Storage(_) => ErrorCode::StorageError,
            AppError::Network(_) => ErrorCode::NetworkError,
            AppError::RateLimited => ErrorCode::RateLimited,
            AppError::InvalidInput(_) => ErrorCode::InvalidInput,
            AppError::NotFound => ErrorCode::NotFound,
            AppError::Internal(_) => ErrorCode::InternalError,
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(e: ValidationError) -> Self {
        AppError::InvalidInput(e.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            AppError::Storage(format!("unexpected response from record store: {e}"))
        } else {
            AppError::Network(e.to_string())
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
