use pitchnode_types::ErrorCode;
use thiserror::Error;

/// Shown when the API gave no usable message.
pub const FALLBACK_ERROR_MESSAGE: &str = "Something went wrong. Please try again.";

/// Client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The API answered with an error body.
    #[error("API error: {code} - {message}")]
    Rejected { code: ErrorCode, message: String },

    /// Request could not be sent or the response could not be read
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Non-success status without a parseable error body
    #[error("Unexpected response status: {0}")]
    UnexpectedStatus(u16),

    #[error("Invalid base URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ClientError {
    /// Message suitable for showing next to the form.
    pub fn user_message(&self) -> &str {
        match self {
            ClientError::Rejected { message, .. } => message,
            _ => FALLBACK_ERROR_MESSAGE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_errors_surface_api_message() {
        let err = ClientError::Rejected {
            code: ErrorCode::InvalidInput,
            message: "Please enter a valid email address".into(),
        };
        assert_eq!(err.user_message(), "Please enter a valid email address");
    }

    #[test]
    fn other_errors_use_fallback() {
        assert_eq!(
            ClientError::UnexpectedStatus(500).user_message(),
            FALLBACK_ERROR_MESSAGE
        );
    }
}
