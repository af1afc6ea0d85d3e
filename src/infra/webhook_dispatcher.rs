//! Fire-and-forget fan-out of waitlist events to configured webhook URLs.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::Semaphore;
use tracing::{error, info, warn};
use url::Url;

use super::{InfraError, http_client::DEFAULT_CONNECT_TIMEOUT, webhook_signer::sign_webhook_payload};
use crate::{
    application::use_cases::waitlist::SignupNotifier,
    domain::entities::{signup::NewSignup, webhook::WaitlistEvent},
};

const MAX_CONCURRENT_DELIVERIES: usize = 10;
const HTTP_TIMEOUT_SECS: u64 = 10;

pub const HEADER_ID: &str = "PitchNode-Webhook-Id";
pub const HEADER_TIMESTAMP: &str = "PitchNode-Webhook-Timestamp";
pub const HEADER_SIGNATURE: &str = "PitchNode-Webhook-Signature";

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Delay before the second attempt; doubled for each one after.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// Backoff before attempt `attempt + 1`, with up to 50% random jitter.
    fn delay_after(&self, attempt: u32) -> Duration {
        let exp = self.base_delay * 2u32.saturating_pow(attempt.saturating_sub(1));
        let jitter_ms = (exp.as_millis() as u64) / 2;
        let jitter = if jitter_ms > 0 {
            rand::thread_rng().gen_range(0..=jitter_ms)
        } else {
            0
        };
        exp + Duration::from_millis(jitter)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered { attempts: u32 },
    /// The endpoint answered with a status that retrying will not fix.
    Rejected { status: u16 },
    GaveUp { attempts: u32 },
}

pub struct WebhookDispatcher {
    client: Client,
    endpoints: Arc<[Url]>,
    secret: Option<SecretString>,
    semaphore: Arc<Semaphore>,
    retry: RetryPolicy,
}

impl WebhookDispatcher {
    pub fn new(endpoints: Vec<Url>, secret: Option<SecretString>) -> Result<Self, InfraError> {
        let client = Client::builder()
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(InfraError::HttpClient)?;

        Ok(Self {
            client,
            endpoints: endpoints.into(),
            secret,
            semaphore: Arc::new(Semaphore::new(MAX_CONCURRENT_DELIVERIES)),
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn endpoint_count(&self) -> usize {
        self.endpoints.len()
    }
}

#[async_trait]
impl SignupNotifier for WebhookDispatcher {
    async fn signup_created(&self, record_id: &str, signup: &NewSignup) {
        let event = WaitlistEvent::signup_created(record_id, signup);
        let body = match serde_json::to_string(&event) {
            Ok(body) => body,
            Err(e) => {
                error!(error = %e, "Failed to serialize webhook event");
                return;
            }
        };
        let body: Arc<str> = body.into();
        let event_id: Arc<str> = event.id.into();

        info!(
            event_id = %event_id,
            endpoints = self.endpoints.len(),
            "Dispatching waitlist.signup_created"
        );

        for url in self.endpoints.iter().cloned() {
            let client = self.client.clone();
            let sem = Arc::clone(&self.semaphore);
            let secret = self.secret.clone();
            let retry = self.retry;
            let body = Arc::clone(&body);
            let event_id = Arc::clone(&event_id);

            tokio::spawn(async move {
                let Ok(_permit) = sem.acquire_owned().await else {
                    warn!("Webhook semaphore closed, dropping delivery");
                    return;
                };
                let outcome = deliver_with_retries(
                    &client,
                    &url,
                    &event_id,
                    &body,
                    secret.as_ref(),
                    retry,
                )
                .await;
                match outcome {
                    DeliveryOutcome::Delivered { attempts } => {
                        info!(event_id = %event_id, url = %url, attempts, "Webhook delivered")
                    }
                    DeliveryOutcome::Rejected { status } => {
                        warn!(event_id = %event_id, url = %url, status, "Webhook rejected")
                    }
                    DeliveryOutcome::GaveUp { attempts } => {
                        error!(event_id = %event_id, url = %url, attempts, "Webhook delivery failed")
                    }
                }
            });
        }
    }
}

pub async fn deliver_with_retries(
    client: &Client,
    url: &Url,
    event_id: &str,
    body: &str,
    secret: Option<&SecretString>,
    retry: RetryPolicy,
) -> DeliveryOutcome {
    let max_attempts = retry.max_attempts.max(1);

    for attempt in 1..=max_attempts {
        let timestamp = chrono::Utc::now().timestamp();
        let mut req = client
            .post(url.clone())
            .header("Content-Type", "application/json")
            .header(HEADER_ID, event_id)
            .header(HEADER_TIMESTAMP, timestamp.to_string());
        if let Some(secret) = secret {
            req = req.header(
                HEADER_SIGNATURE,
                sign_webhook_payload(secret.expose_secret(), timestamp, body),
            );
        }

        match req.body(body.to_string()).send().await {
            Ok(resp) if resp.status().is_success() => {
                return DeliveryOutcome::Delivered { attempts: attempt };
            }
            Ok(resp) => {
                let status = resp.status().as_u16();
                if is_terminal_status(status) {
                    return DeliveryOutcome::Rejected { status };
                }
                warn!(url = %url, status, attempt, "Webhook attempt failed");
            }
            Err(e) => {
                warn!(url = %url, error = %e, attempt, "Webhook attempt failed");
            }
        }

        if attempt < max_attempts {
            tokio::time::sleep(retry.delay_after(attempt)).await;
        }
    }

    DeliveryOutcome::GaveUp {
        attempts: max_attempts,
    }
}

fn is_terminal_status(status: u16) -> bool {
    // 4xx (client errors) are terminal, except 408 Request Timeout and 429 Too Many Requests
    (400..500).contains(&status) && !matches!(status, 408 | 429)
}

/// Notifier used when no webhook URLs are configured.
pub struct NoopNotifier;

#[async_trait]
impl SignupNotifier for NoopNotifier {
    async fn signup_created(&self, _record_id: &str, _signup: &NewSignup) {}
}
