use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::entities::signup::NewSignup;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WaitlistEventType {
    #[serde(rename = "waitlist.signup_created")]
    SignupCreated,
}

impl WaitlistEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SignupCreated => "waitlist.signup_created",
        }
    }
}

impl fmt::Display for WaitlistEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WaitlistEventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "waitlist.signup_created" => Ok(Self::SignupCreated),
            _ => Err(format!("unknown waitlist event type: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SignupCreatedPayload {
    pub record_id: String,
    pub name: String,
    pub email: String,
    pub role: Option<String>,
    pub experience_rating: i64,
    pub source: String,
    pub signed_up_at: String,
}

impl SignupCreatedPayload {
    pub fn new(record_id: &str, signup: &NewSignup) -> Self {
        Self {
            record_id: record_id.to_string(),
            name: signup.name.clone(),
            email: signup.email.clone(),
            role: signup.role.clone(),
            experience_rating: signup.experience_rating.get(),
            source: signup.source.to_string(),
            signed_up_at: signup.created_at.to_rfc3339(),
        }
    }
}

/// Envelope posted to every webhook endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct WaitlistEvent<T> {
    /// `evt_<uuid>`, also sent as the `PitchNode-Webhook-Id` header.
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: WaitlistEventType,
    pub created_at: DateTime<Utc>,
    pub data: T,
}

impl WaitlistEvent<SignupCreatedPayload> {
    pub fn signup_created(record_id: &str, signup: &NewSignup) -> Self {
        Self {
            id: format!("evt_{}", Uuid::new_v4()),
            event_type: WaitlistEventType::SignupCreated,
            created_at: Utc::now(),
            data: SignupCreatedPayload::new(record_id, signup),
        }
    }
}
