//! Rust client for the PitchNode waitlist.
//!
//! # Features
//!
//! - **API client** - Fetch the waitlist count and submit signups
//! - **Signup form** - The four-step form as a state machine, validated with
//!   the same rules the API applies
//! - **Count polling** - A background task publishing the latest count
//!
//! # Example
//!
//! ```rust,ignore
//! use pitchnode_client::{CountPoller, PollerConfig, WaitlistClient, WaitlistForm};
//!
//! let client = WaitlistClient::new(&"https://pitchnode.example".parse()?)?;
//! let poller = CountPoller::spawn(client.clone(), PollerConfig::default());
//!
//! let mut form = WaitlistForm::new();
//! form.update_name("Ada Lovelace");
//! form.next_step();
//! // ...
//! let request = form.begin_submit()?;
//! form.finish_submit(&client.submit(&request).await);
//! ```

mod client;
mod error;
mod form;
mod poller;

pub use client::{SubmitOutcome, WaitlistClient};
pub use error::{ClientError, FALLBACK_ERROR_MESSAGE};
pub use form::{FormError, FormStep, TOTAL_STEPS, WaitlistForm};
pub use poller::{
    CountPoller, CountState, DEFAULT_INITIAL_COUNT, DEFAULT_POLL_INTERVAL, PollerConfig,
};

// Re-export shared types for convenience
pub use pitchnode_types::{ErrorCode, SubmitRequest, ValidationError};
