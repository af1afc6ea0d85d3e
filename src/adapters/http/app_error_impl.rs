use crate::app_error::{AppError, ErrorCode};
use axum::Json;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use pitchnode_types::ErrorBody;

const NETWORK_ERROR_MESSAGE: &str = "Network error. Please try again.";

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the error before it gets converted into a status response.
        match &self {
            AppError::InvalidInput(_) | AppError::RateLimited | AppError::NotFound => {
                tracing::warn!(error = %self, "Request rejected")
            }
            _ => tracing::error!(error = ?self, "Request failed"),
        }

        match self {
            AppError::Storage(msg) => {
                error_resp(StatusCode::BAD_GATEWAY, ErrorCode::StorageError, Some(msg))
            }
            AppError::Network(_) => error_resp(
                StatusCode::BAD_GATEWAY,
                ErrorCode::NetworkError,
                Some(NETWORK_ERROR_MESSAGE.to_string()),
            ),
            AppError::RateLimited => {
                error_resp(StatusCode::TOO_MANY_REQUESTS, ErrorCode::RateLimited, None)
            }
            AppError::InvalidInput(msg) => {
                error_resp(StatusCode::BAD_REQUEST, ErrorCode::InvalidInput, Some(msg))
            }
            AppError::NotFound => error_resp(StatusCode::NOT_FOUND, ErrorCode::NotFound, None),
            AppError::Internal(_) => error_resp(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::InternalError,
                None,
            ),
        }
    }
}

fn error_resp(status: StatusCode, code: ErrorCode, message: Option<String>) -> Response {
    (status, Json(ErrorBody { code, message })).into_response()
}
