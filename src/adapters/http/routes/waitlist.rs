use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};
use pitchnode_types::{CountResponse, SubmitRequest, SubmitResponse};

use crate::{
    adapters::http::{app_state::AppState, middleware::ClientIp},
    app_error::{AppError, AppResult},
};

/// Lets a CDN serve the count for 10s and revalidate in the background for 30s more.
const COUNT_CACHE_CONTROL: &str = "public, s-maxage=10, stale-while-revalidate=30";

/// GET /waitlist-count
///
/// Always 200: a store outage is reported in the logs and the last known
/// (or base) count is served instead.
async fn waitlist_count(State(app_state): State<AppState>) -> impl IntoResponse {
    let snapshot = app_state.waitlist_use_cases.waitlist_count().await;
    if let Some(error) = &snapshot.error {
        tracing::warn!(error = %error, count = snapshot.count, "Serving fallback waitlist count");
    }

    (
        [(header::CACHE_CONTROL, COUNT_CACHE_CONTROL)],
        Json(CountResponse {
            count: snapshot.count,
        }),
    )
}

/// POST /waitlist
async fn submit(
    State(app_state): State<AppState>,
    ClientIp(ip): ClientIp,
    payload: Result<Json<SubmitRequest>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(req) = payload.map_err(|rejection| {
        tracing::debug!(error = %rejection, "Malformed waitlist submission");
        AppError::InvalidInput("Invalid request body".into())
    })?;

    app_state
        .rate_limiter
        .check(&ip, Some(req.email.as_str()))
        .await?;

    let receipt = app_state.waitlist_use_cases.submit_signup(&req).await?;

    let status = if receipt.is_duplicate {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };

    Ok((
        status,
        Json(SubmitResponse {
            success: true,
            is_duplicate: receipt.is_duplicate,
        }),
    ))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/waitlist-count", get(waitlist_count))
        .route("/waitlist", post(submit))
}
