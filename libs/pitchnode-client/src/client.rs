//! Waitlist API client.

use std::time::Duration;

use pitchnode_types::{CountResponse, ErrorBody, ErrorCode, SubmitRequest, SubmitResponse};
use url::Url;

use crate::error::{ClientError, FALLBACK_ERROR_MESSAGE};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Result of a successful submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Created,
    /// The email was already on the list. Shown to the user as a success.
    Duplicate,
}

/// Client for the `/api/waitlist*` endpoints.
#[derive(Debug, Clone)]
pub struct WaitlistClient {
    http_client: reqwest::Client,
    count_url: Url,
    submit_url: Url,
}

impl WaitlistClient {
    /// Create a client for the API served at `base_url` (the site origin).
    pub fn new(base_url: &Url) -> Result<Self, ClientError> {
        let http_client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Self::with_http_client(base_url, http_client)
    }

    pub fn with_http_client(
        base_url: &Url,
        http_client: reqwest::Client,
    ) -> Result<Self, ClientError> {
        let mut base = base_url.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        Ok(Self {
            http_client,
            count_url: base.join("api/waitlist-count")?,
            submit_url: base.join("api/waitlist")?,
        })
    }

    /// Current waitlist size.
    pub async fn fetch_count(&self) -> Result<u64, ClientError> {
        let response = self.http_client.get(self.count_url.clone()).send().await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let body: CountResponse = response.json().await?;
        Ok(body.count)
    }

    /// Submit a signup. A duplicate email is reported as
    /// [`SubmitOutcome::Duplicate`], not as an error.
    pub async fn submit(&self, request: &SubmitRequest) -> Result<SubmitOutcome, ClientError> {
        let response = self
            .http_client
            .post(self.submit_url.clone())
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let body: SubmitResponse = response.json().await?;
        if !body.success {
            return Err(ClientError::Rejected {
                code: ErrorCode::InternalError,
                message: FALLBACK_ERROR_MESSAGE.to_string(),
            });
        }

        Ok(if body.is_duplicate {
            SubmitOutcome::Duplicate
        } else {
            SubmitOutcome::Created
        })
    }
}

async fn error_from_response(response: reqwest::Response) -> ClientError {
    let status = response.status().as_u16();
    match response.json::<ErrorBody>().await {
        Ok(body) => {
            tracing::debug!(status, code = %body.code, "Waitlist API rejected request");
            ClientError::Rejected {
                code: body.code,
                message: body
                    .message
                    .unwrap_or_else(|| FALLBACK_ERROR_MESSAGE.to_string()),
            }
        }
        Err(_) => ClientError::UnexpectedStatus(status),
    }
}
