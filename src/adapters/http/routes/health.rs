use axum::{Json, extract::State};
use serde::Serialize;

use crate::adapters::http::app_state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub backend: &'static str,
}

pub async fn health(State(app_state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        backend: app_state.waitlist_use_cases.backend(),
    })
}
