//! Airtable REST (v0) record store.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{Value as JsonValue, json};
use url::Url;

use crate::{
    app_error::{AppError, AppResult},
    application::use_cases::waitlist::{InsertOutcome, WaitlistStore},
    domain::entities::signup::NewSignup,
};

pub const DEFAULT_API_BASE: &str = "https://api.airtable.com/v0";
pub const DEFAULT_TABLE_NAME: &str = "Waitlist Signups";

/// Airtable's maximum page size for list requests.
const PAGE_SIZE: &str = "100";

const SAVE_FAILED: &str = "Failed to save to waitlist";
const SAVE_FAILED_SCHEMA: &str = "Failed to save to waitlist. Please check server logs.";

#[derive(Clone)]
pub struct AirtableStore {
    client: Client,
    table_url: Url,
    api_key: SecretString,
}

impl AirtableStore {
    /// Returns `None` when `api_base` cannot carry path segments.
    pub fn new(
        client: Client,
        api_base: &Url,
        base_id: &str,
        table_name: &str,
        api_key: SecretString,
    ) -> Option<Self> {
        let mut table_url = api_base.clone();
        table_url
            .path_segments_mut()
            .ok()?
            .pop_if_empty()
            .push(base_id)
            .push(table_name);
        Some(Self {
            client,
            table_url,
            api_key,
        })
    }

    fn get(&self) -> reqwest::RequestBuilder {
        self.client
            .get(self.table_url.clone())
            .bearer_auth(self.api_key.expose_secret())
    }
}

#[derive(Deserialize)]
struct RecordRef {
    id: String,
}

#[derive(Deserialize)]
struct ListResponse {
    #[serde(default)]
    records: Vec<RecordRef>,
    offset: Option<String>,
}

#[derive(Deserialize)]
struct CreateResponse {
    #[serde(default)]
    records: Vec<RecordRef>,
}

fn signup_fields(signup: &NewSignup) -> JsonValue {
    let mut fields = json!({
        "Name": signup.name,
        "Email": signup.email,
        "Experience Rating": signup.experience_rating.get(),
        "Source": signup.source.as_ref(),
        "Status": signup.status.as_ref(),
    });
    if let Some(role) = &signup.role {
        fields["Role"] = json!(role);
    }
    fields
}

/// Airtable reports errors either as `{"error": "CODE"}` or
/// `{"error": {"type": "...", "message": "..."}}`.
fn error_message(body: &JsonValue) -> Option<&str> {
    match body.get("error")? {
        JsonValue::String(code) => Some(code.as_str()),
        JsonValue::Object(err) => err
            .get("message")
            .or_else(|| err.get("type"))
            .and_then(JsonValue::as_str),
        _ => None,
    }
}

/// Quote a value for use inside a single-quoted formula string.
fn formula_string(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('\'', "\\'");
    format!("'{escaped}'")
}

#[async_trait]
impl WaitlistStore for AirtableStore {
    fn backend(&self) -> &'static str {
        "airtable"
    }

    async fn create(&self, signup: &NewSignup) -> AppResult<InsertOutcome> {
        let body = json!({ "records": [{ "fields": signup_fields(signup) }] });

        let resp = self
            .client
            .post(self.table_url.clone())
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let err_body: JsonValue = resp.json().await.unwrap_or(JsonValue::Null);
            let message = error_message(&err_body).unwrap_or_default();
            tracing::error!(%status, error = %err_body, "Airtable rejected signup");

            if message.contains("Unknown field name") {
                tracing::error!(
                    "Airtable table is missing a column. Expected Name, Email, Experience Rating (number), Role, Source, Status."
                );
                return Err(AppError::Storage(SAVE_FAILED_SCHEMA.to_string()));
            }
            return Err(AppError::Storage(SAVE_FAILED.to_string()));
        }

        let created: CreateResponse = resp.json().await?;
        let record = created
            .records
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Storage(SAVE_FAILED.to_string()))?;
        Ok(InsertOutcome::Created(record.id))
    }

    async fn email_exists(&self, email: &str) -> AppResult<bool> {
        let formula = format!("{{Email}} = {}", formula_string(email));

        let resp = self
            .get()
            .query(&[
                ("filterByFormula", formula.as_str()),
                ("maxRecords", "1"),
                ("fields[]", "Email"),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(AppError::Storage(format!(
                "Airtable duplicate lookup failed with status {status}"
            )));
        }

        let list: ListResponse = resp.json().await?;
        Ok(!list.records.is_empty())
    }

    async fn count(&self) -> AppResult<u64> {
        let mut total: u64 = 0;
        let mut offset: Option<String> = None;

        loop {
            let mut req = self
                .get()
                .query(&[("pageSize", PAGE_SIZE), ("fields[]", "Email")]);
            if let Some(offset) = &offset {
                req = req.query(&[("offset", offset.as_str())]);
            }

            let resp = req.send().await?;
            let status = resp.status();
            if !status.is_success() {
                let text = resp.text().await.unwrap_or_default();
                tracing::error!(%status, body = %text, "Airtable count request failed");
                return Err(AppError::Storage("Failed to fetch count".to_string()));
            }

            let page: ListResponse = resp.json().await?;
            total += page.records.len() as u64;

            match page.offset {
                Some(next) => offset = Some(next),
                None => break,
            }
        }

        tracing::debug!(records = total, "Counted Airtable records");
        Ok(total)
    }
}
