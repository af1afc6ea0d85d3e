//! The waitlist signup form as a state machine.
//!
//! Steps run `Name → Email → Role → Experience`, then `Submitting` while the
//! request is in flight and `Success` once it went through.

use pitchnode_types::{
    DEFAULT_EXPERIENCE_RATING, SubmitRequest, ValidationError, validate_email, validate_name,
    validate_role, validate_submission,
};
use thiserror::Error;

use crate::{client::SubmitOutcome, error::ClientError};

/// Number of visible steps.
pub const TOTAL_STEPS: u8 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormStep {
    Name,
    Email,
    Role,
    Experience,
    Submitting,
    Success,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    /// `begin_submit` was called outside the experience step.
    #[error("Form is not ready to submit")]
    NotReady,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitlistForm {
    step: FormStep,
    name: String,
    email: String,
    role: String,
    rating: i64,
    error: Option<String>,
}

impl Default for WaitlistForm {
    fn default() -> Self {
        Self::new()
    }
}

impl WaitlistForm {
    pub fn new() -> Self {
        Self {
            step: FormStep::Name,
            name: String::new(),
            email: String::new(),
            role: String::new(),
            rating: DEFAULT_EXPERIENCE_RATING,
            error: None,
        }
    }

    pub fn step(&self) -> FormStep {
        self.step
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn rating(&self) -> i64 {
        self.rating
    }

    /// Message to show under the current field, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn update_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.error = None;
    }

    pub fn update_email(&mut self, email: impl Into<String>) {
        self.email = email.into();
        self.error = None;
    }

    pub fn update_role(&mut self, role: impl Into<String>) {
        self.role = role.into();
        self.error = None;
    }

    pub fn update_rating(&mut self, rating: i64) {
        self.rating = rating;
        self.error = None;
    }

    /// Validate the current step's field and advance. Returns whether the
    /// step changed.
    pub fn next_step(&mut self) -> bool {
        let (check, next) = match self.step {
            FormStep::Name => (validate_name(&self.name), FormStep::Email),
            FormStep::Email => (validate_email(&self.email), FormStep::Role),
            FormStep::Role => (validate_role(Some(&self.role)), FormStep::Experience),
            FormStep::Experience | FormStep::Submitting | FormStep::Success => return false,
        };

        match check {
            Ok(()) => {
                self.step = next;
                self.error = None;
                true
            }
            Err(e) => {
                self.error = Some(e.to_string());
                false
            }
        }
    }

    /// Go back one step. Returns whether the step changed.
    pub fn prev_step(&mut self) -> bool {
        let prev = match self.step {
            FormStep::Email => FormStep::Name,
            FormStep::Role => FormStep::Email,
            FormStep::Experience => FormStep::Role,
            FormStep::Name | FormStep::Submitting | FormStep::Success => return false,
        };
        self.step = prev;
        self.error = None;
        true
    }

    /// Validate everything and move to `Submitting`, returning the request to
    /// send. Only valid on the experience step.
    pub fn begin_submit(&mut self) -> Result<SubmitRequest, FormError> {
        if self.step != FormStep::Experience {
            return Err(FormError::NotReady);
        }

        let role = self.role.trim();
        let request = SubmitRequest {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            role: (!role.is_empty()).then(|| role.to_string()),
            experience_rating: self.rating,
        };

        if let Err(e) = validate_submission(&request) {
            self.error = Some(e.to_string());
            return Err(e.into());
        }

        self.step = FormStep::Submitting;
        self.error = None;
        Ok(request)
    }

    /// Apply the API response to a submission started with `begin_submit`.
    pub fn finish_submit(&mut self, result: &Result<SubmitOutcome, ClientError>) {
        if self.step != FormStep::Submitting {
            return;
        }

        match result {
            Ok(_) => {
                self.step = FormStep::Success;
                self.error = None;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Waitlist submission failed");
                self.step = FormStep::Experience;
                self.error = Some(e.user_message().to_string());
            }
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn is_submitting(&self) -> bool {
        self.step == FormStep::Submitting
    }

    /// 1-based position in the progress indicator.
    pub fn step_number(&self) -> u8 {
        match self.step {
            FormStep::Name => 1,
            FormStep::Email => 2,
            FormStep::Role => 3,
            FormStep::Experience | FormStep::Submitting | FormStep::Success => TOTAL_STEPS,
        }
    }

    pub fn progress_percent(&self) -> u8 {
        self.step_number() * 100 / TOTAL_STEPS
    }

    /// First word of the name, for the thank-you screen.
    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or_default()
    }
}
