use sqlx::PgPool;

use crate::app_error::AppError;

pub mod waitlist_signup;

#[derive(Clone)]
pub struct PostgresPersistence {
    pool: PgPool,
}

impl PostgresPersistence {
    pub fn new(pool: PgPool) -> Self {
        PostgresPersistence { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => AppError::NotFound,
            sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                tracing::error!(error = %err, "Database unreachable");
                AppError::Network("Database unreachable".into())
            }
            _ => {
                // Log the actual error, but don't expose details
                tracing::error!(error = ?err, "Database error");
                AppError::Storage("Failed to save to waitlist".into())
            }
        }
    }
}
