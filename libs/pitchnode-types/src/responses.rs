use serde::{Deserialize, Serialize};

/// Body of `GET /api/waitlist-count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountResponse {
    pub count: u64,
}

/// Body of `POST /api/waitlist`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    pub name: String,
    pub email: String,

    /// Job title or what the person is working on. Optional.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    /// Self-assessed sales experience, 1 to 10.
    pub experience_rating: i64,
}

/// Successful submission result.
///
/// A duplicate email is still a success so the form can show the thank-you screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub success: bool,
    pub is_duplicate: bool,
}
