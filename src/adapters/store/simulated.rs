//! Fallback store used when no backend is configured. Nothing is persisted.

use async_trait::async_trait;
use chrono::Utc;

use crate::{
    app_error::AppResult,
    application::use_cases::waitlist::{InsertOutcome, WaitlistStore},
    domain::entities::signup::NewSignup,
};

#[derive(Clone, Copy, Debug, Default)]
pub struct SimulatedStore;

#[async_trait]
impl WaitlistStore for SimulatedStore {
    fn backend(&self) -> &'static str {
        "simulated"
    }

    async fn create(&self, signup: &NewSignup) -> AppResult<InsertOutcome> {
        tracing::warn!(
            email = %signup.email,
            "No waitlist backend configured, signup was not persisted"
        );
        Ok(InsertOutcome::Created(format!(
            "simulated_{}",
            Utc::now().timestamp_millis()
        )))
    }

    async fn email_exists(&self, _email: &str) -> AppResult<bool> {
        Ok(false)
    }

    async fn count(&self) -> AppResult<u64> {
        Ok(0)
    }
}
