//! HTTP client factory with consistent timeout configuration.
//!
//! Record-store adapters and the webhook dispatcher get their
//! `reqwest::Client` from here rather than constructing one directly.

use reqwest::Client;
use std::time::Duration;

/// TCP handshake plus TLS.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Whole request, response body included. Airtable and PostgREST answer well within this.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Client for outbound record-store calls.
pub fn try_build_client() -> Result<Client, reqwest::Error> {
    Client::builder()
        .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
        .timeout(DEFAULT_REQUEST_TIMEOUT)
        .build()
}
