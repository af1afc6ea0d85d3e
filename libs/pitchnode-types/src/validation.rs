//! Field validators for the waitlist form.
//!
//! The same rules run in the browser-side form state machine and on the
//! server before anything reaches the record store.

use thiserror::Error;
use validator::ValidateEmail;

use crate::SubmitRequest;

pub const MIN_NAME_LEN: usize = 2;
pub const MAX_NAME_LEN: usize = 100;
pub const MAX_ROLE_LEN: usize = 100;
pub const MIN_EXPERIENCE_RATING: i64 = 1;
pub const MAX_EXPERIENCE_RATING: i64 = 10;
pub const DEFAULT_EXPERIENCE_RATING: i64 = 5;

/// Validation failures. `Display` is the message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Name is required")]
    NameRequired,

    #[error("Name must be at least 2 characters")]
    NameTooShort,

    #[error("Name must be at most 100 characters")]
    NameTooLong,

    #[error("Email is required")]
    EmailRequired,

    #[error("Please enter a valid email address")]
    EmailInvalid,

    #[error("Role must be at most 100 characters")]
    RoleTooLong,

    #[error("Experience rating must be between 1 and 10")]
    RatingOutOfRange,
}

pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::NameRequired);
    }
    let len = trimmed.chars().count();
    if len < MIN_NAME_LEN {
        return Err(ValidationError::NameTooShort);
    }
    if len > MAX_NAME_LEN {
        return Err(ValidationError::NameTooLong);
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    let trimmed = email.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmailRequired);
    }
    if !has_dotted_domain(trimmed) || !trimmed.validate_email() {
        return Err(ValidationError::EmailInvalid);
    }
    Ok(())
}

/// Blank roles are accepted and stored as absent.
pub fn validate_role(role: Option<&str>) -> Result<(), ValidationError> {
    match role.map(str::trim) {
        Some(r) if r.chars().count() > MAX_ROLE_LEN => Err(ValidationError::RoleTooLong),
        _ => Ok(()),
    }
}

pub fn validate_experience_rating(rating: i64) -> Result<(), ValidationError> {
    if (MIN_EXPERIENCE_RATING..=MAX_EXPERIENCE_RATING).contains(&rating) {
        Ok(())
    } else {
        Err(ValidationError::RatingOutOfRange)
    }
}

/// Runs every field check in form order and returns the first failure.
pub fn validate_submission(req: &SubmitRequest) -> Result<(), ValidationError> {
    validate_name(&req.name)?;
    validate_email(&req.email)?;
    validate_role(req.role.as_deref())?;
    validate_experience_rating(req.experience_rating)
}

// `local@domain.tld` shape: no whitespace, one `@`, and a dot inside the
// domain with something on both sides of it.
fn has_dotted_domain(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((head, tld)) => !head.is_empty() && !tld.is_empty(),
        None => false,
    }
}
