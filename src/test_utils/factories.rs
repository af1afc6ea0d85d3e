//! Test data factories for creating valid test fixtures.
//!
//! Each factory function creates a complete, valid object with sensible defaults.
//! Use the closure parameter to override specific fields as needed.

use pitchnode_types::SubmitRequest;

use crate::domain::entities::signup::NewSignup;

/// Create a valid submission with sensible defaults.
pub fn create_test_request(overrides: impl FnOnce(&mut SubmitRequest)) -> SubmitRequest {
    let mut req = SubmitRequest {
        name: "Ada Lovelace".to_string(),
        email: "ada@example.com".to_string(),
        role: Some("Account Executive".to_string()),
        experience_rating: 7,
    };
    overrides(&mut req);
    req
}

/// Create a normalized signup with sensible defaults.
pub fn create_test_signup(overrides: impl FnOnce(&mut SubmitRequest)) -> NewSignup {
    NewSignup::from_request(&create_test_request(overrides)).expect("test signup should be valid")
}
