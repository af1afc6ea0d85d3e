use std::convert::Infallible;
use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{HeaderMap, request::Parts},
};

use crate::adapters::http::app_state::AppState;

/// Client address used as the rate-limit key.
///
/// Forwarded headers are only honored when `TRUST_PROXY` is set. Without
/// connect info (e.g. in-process test servers) the address is `"unknown"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp(pub String);

impl FromRequestParts<AppState> for ClientIp {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let connect_ip = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string());

        // Only trust forwarded headers if explicitly configured (when behind a reverse proxy)
        let forwarded = forwarded_ip(&parts.headers);
        let ip = if state.config.trust_proxy {
            forwarded.clone().or_else(|| connect_ip.clone())
        } else {
            connect_ip.clone()
        }
        .unwrap_or_else(|| "unknown".to_string());

        tracing::debug!(
            trust_proxy = state.config.trust_proxy,
            connect_ip = ?connect_ip,
            forwarded_ip = ?forwarded,
            using_ip = %ip,
            "Resolved client address"
        );

        Ok(ClientIp(ip))
    }
}

fn forwarded_ip(headers: &HeaderMap) -> Option<String> {
    // Extract IP from X-Forwarded-For or X-Real-IP headers
    if let Some(forwarded) = headers.get("x-forwarded-for")
        && let Ok(val) = forwarded.to_str()
        && let Some(first) = val.split(',').next()
    {
        let trimmed = first.trim();
        if !trimmed.is_empty() {
            return Some(trimmed.to_string());
        }
    }
    if let Some(real) = headers.get("x-real-ip")
        && let Ok(val) = real.to_str()
        && !val.trim().is_empty()
    {
        return Some(val.trim().to_string());
    }
    None
}
