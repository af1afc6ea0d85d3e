use chrono::{DateTime, Utc};
use pitchnode_types::{
    DEFAULT_EXPERIENCE_RATING, SubmitRequest, ValidationError, validate_experience_rating,
    validate_submission,
};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Self-assessed sales experience, always within 1..=10.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct ExperienceRating(u8);

impl ExperienceRating {
    pub fn new(value: i64) -> Result<Self, ValidationError> {
        validate_experience_rating(value)?;
        Ok(Self(value as u8))
    }

    pub fn get(self) -> i64 {
        i64::from(self.0)
    }
}

impl Default for ExperienceRating {
    fn default() -> Self {
        Self(DEFAULT_EXPERIENCE_RATING as u8)
    }
}

impl TryFrom<i64> for ExperienceRating {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ExperienceRating> for i64 {
    fn from(rating: ExperienceRating) -> Self {
        rating.get()
    }
}

/// Where a signup came from. Stored verbatim in the record store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, AsRefStr)]
pub enum SignupSource {
    #[default]
    #[strum(serialize = "Landing Page")]
    LandingPage,
}

/// Triage status of a signup in the record store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, AsRefStr)]
pub enum SignupStatus {
    #[default]
    New,
}

/// A validated, normalized signup ready to be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSignup {
    pub name: String,
    /// Trimmed and lowercased; the duplicate check relies on this.
    pub email: String,
    pub role: Option<String>,
    pub experience_rating: ExperienceRating,
    pub source: SignupSource,
    pub status: SignupStatus,
    pub created_at: DateTime<Utc>,
}

impl NewSignup {
    /// Validate a raw submission and normalize its fields.
    pub fn from_request(req: &SubmitRequest) -> Result<Self, ValidationError> {
        validate_submission(req)?;

        let role = req
            .role
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string);

        Ok(Self {
            name: req.name.trim().to_string(),
            email: normalize_email(&req.email),
            role,
            experience_rating: ExperienceRating::new(req.experience_rating)?,
            source: SignupSource::default(),
            status: SignupStatus::default(),
            created_at: Utc::now(),
        })
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Outcome of a waitlist submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignupReceipt {
    /// Store-assigned id; `None` when the email was already on the list.
    pub record_id: Option<String>,
    pub is_duplicate: bool,
}

impl SignupReceipt {
    pub fn created(record_id: String) -> Self {
        Self {
            record_id: Some(record_id),
            is_duplicate: false,
        }
    }

    pub fn duplicate() -> Self {
        Self {
            record_id: None,
            is_duplicate: true,
        }
    }
}
