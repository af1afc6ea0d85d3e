//! Shared types for the PitchNode waitlist.
//!
//! This crate provides:
//! - Request/response bodies for the waitlist endpoints
//! - API error codes
//! - Field validators used by both the API and the signup form

mod errors;
mod responses;
mod validation;

pub use errors::{ErrorBody, ErrorCode};
pub use responses::{CountResponse, SubmitRequest, SubmitResponse};
pub use validation::{
    DEFAULT_EXPERIENCE_RATING, MAX_EXPERIENCE_RATING, MAX_NAME_LEN, MAX_ROLE_LEN,
    MIN_EXPERIENCE_RATING, MIN_NAME_LEN, ValidationError, validate_email,
    validate_experience_rating, validate_name, validate_role, validate_submission,
};
