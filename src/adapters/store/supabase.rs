//! Supabase record store, spoken to through its PostgREST endpoint.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{Value as JsonValue, json};
use url::Url;

use crate::{
    app_error::{AppError, AppResult},
    application::use_cases::waitlist::{InsertOutcome, WaitlistStore},
    domain::entities::signup::NewSignup,
};

pub const TABLE_NAME: &str = "waitlist_signups";

/// Postgres error code for unique_violation.
const UNIQUE_VIOLATION: &str = "23505";

#[derive(Clone)]
pub struct SupabaseStore {
    client: Client,
    table_url: Url,
    anon_key: SecretString,
}

impl SupabaseStore {
    /// Returns `None` when `project_url` cannot carry path segments.
    pub fn new(client: Client, project_url: &Url, anon_key: SecretString) -> Option<Self> {
        let mut table_url = project_url.clone();
        table_url
            .path_segments_mut()
            .ok()?
            .pop_if_empty()
            .extend(["rest", "v1", TABLE_NAME]);
        Some(Self {
            client,
            table_url,
            anon_key,
        })
    }

    fn authed(&self, req: RequestBuilder) -> RequestBuilder {
        let key = self.anon_key.expose_secret();
        req.header("apikey", key).bearer_auth(key)
    }
}

#[derive(Deserialize)]
struct InsertedRow {
    id: JsonValue,
}

#[derive(Deserialize)]
struct PostgrestError {
    code: Option<String>,
    message: Option<String>,
}

/// Total from a PostgREST `Content-Range` header (`0-24/3573` or `*/0`).
fn content_range_total(header: &str) -> Option<u64> {
    header.rsplit_once('/')?.1.trim().parse().ok()
}

fn row_id(id: JsonValue) -> String {
    match id {
        JsonValue::String(s) => s,
        other => other.to_string(),
    }
}

#[async_trait]
impl WaitlistStore for SupabaseStore {
    fn backend(&self) -> &'static str {
        "supabase"
    }

    async fn create(&self, signup: &NewSignup) -> AppResult<InsertOutcome> {
        let row = json!({
            "name": signup.name,
            "email": signup.email,
            "experience_rating": signup.experience_rating.get(),
            "job_role": signup.role,
            "source": signup.source.as_ref(),
            "status": signup.status.as_ref(),
        });

        let resp = self
            .authed(self.client.post(self.table_url.clone()))
            .query(&[("select", "id")])
            .header("Prefer", "return=representation")
            .json(&row)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let err: Option<PostgrestError> = resp.json().await.ok();
            let code = err.as_ref().and_then(|e| e.code.as_deref());
            if status == StatusCode::CONFLICT || code == Some(UNIQUE_VIOLATION) {
                return Ok(InsertOutcome::AlreadyExists);
            }
            tracing::error!(
                %status,
                code = ?code,
                message = ?err.as_ref().and_then(|e| e.message.as_deref()),
                "Supabase rejected signup"
            );
            return Err(AppError::Storage("Failed to save to waitlist".to_string()));
        }

        let rows: Vec<InsertedRow> = resp.json().await?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Storage("Failed to save to waitlist".to_string()))?;
        Ok(InsertOutcome::Created(row_id(row.id)))
    }

    async fn email_exists(&self, email: &str) -> AppResult<bool> {
        let filter = format!("eq.{email}");
        let resp = self
            .authed(self.client.get(self.table_url.clone()))
            .query(&[("select", "id"), ("email", filter.as_str()), ("limit", "1")])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(AppError::Storage(format!(
                "Supabase duplicate lookup failed with status {status}"
            )));
        }

        let rows: Vec<JsonValue> = resp.json().await?;
        Ok(!rows.is_empty())
    }

    async fn count(&self) -> AppResult<u64> {
        let resp = self
            .authed(self.client.head(self.table_url.clone()))
            .query(&[("select", "id")])
            .header("Prefer", "count=exact")
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            tracing::error!(%status, "Supabase count request failed");
            return Err(AppError::Storage("Failed to fetch count".to_string()));
        }

        resp.headers()
            .get(reqwest::header::CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(content_range_total)
            .ok_or_else(|| AppError::Storage("Supabase count response had no total".to_string()))
    }
}
