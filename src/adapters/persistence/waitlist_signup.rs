use async_trait::async_trait;
use sqlx::Row;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    application::use_cases::waitlist::{InsertOutcome, WaitlistStore},
    domain::entities::signup::NewSignup,
};

#[async_trait]
impl WaitlistStore for PostgresPersistence {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn create(&self, signup: &NewSignup) -> AppResult<InsertOutcome> {
        let row = sqlx::query(
            r#"
            INSERT INTO waitlist_signups (name, email, job_role, experience_rating, source, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (email) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(&signup.name)
        .bind(&signup.email)
        .bind(signup.role.as_deref())
        .bind(signup.experience_rating.get() as i16)
        .bind(signup.source.as_ref())
        .bind(signup.status.as_ref())
        .bind(signup.created_at)
        .fetch_optional(self.pool())
        .await
        .map_err(AppError::from)?;

        Ok(match row {
            Some(row) => InsertOutcome::Created(row.get::<Uuid, _>("id").to_string()),
            None => InsertOutcome::AlreadyExists,
        })
    }

    async fn email_exists(&self, email: &str) -> AppResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM waitlist_signups WHERE email = $1)")
                .bind(email)
                .fetch_one(self.pool())
                .await
                .map_err(AppError::from)?;
        Ok(exists)
    }

    async fn count(&self) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM waitlist_signups")
            .fetch_one(self.pool())
            .await
            .map_err(AppError::from)?;
        Ok(count.max(0) as u64)
    }
}
