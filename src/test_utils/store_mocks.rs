//! In-memory implementations of the waitlist ports.

use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::{
    app_error::{AppError, AppResult},
    application::use_cases::waitlist::{InsertOutcome, SignupNotifier, WaitlistStore},
    domain::entities::signup::NewSignup,
};

/// In-memory implementation of WaitlistStore for testing.
///
/// Rejects a second row with the same email on insert, like a store with a
/// unique index would.
#[derive(Default)]
pub struct InMemoryWaitlistStore {
    rows: Mutex<Vec<(String, String)>>, // (record_id, email)
    fail_lookups: AtomicBool,
    fail_inserts: AtomicBool,
    fail_counts: AtomicBool,
    lookup_calls: AtomicUsize,
    count_calls: AtomicUsize,
}

impl InMemoryWaitlistStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with existing signups.
    pub fn with_emails(emails: &[&str]) -> Self {
        let store = Self::new();
        for email in emails {
            store.insert_raw(email);
        }
        store
    }

    pub fn insert_raw(&self, email: &str) {
        let mut rows = self.rows.lock().unwrap();
        let id = format!("rec{}", rows.len() + 1);
        rows.push((id, email.to_string()));
    }

    /// Get all stored emails (for test assertions).
    pub fn emails(&self) -> Vec<String> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .map(|(_, email)| email.clone())
            .collect()
    }

    pub fn fail_lookups(&self, fail: bool) {
        self.fail_lookups.store(fail, Ordering::SeqCst);
    }

    pub fn fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::SeqCst);
    }

    pub fn fail_counts(&self, fail: bool) {
        self.fail_counts.store(fail, Ordering::SeqCst);
    }

    pub fn lookup_calls(&self) -> usize {
        self.lookup_calls.load(Ordering::SeqCst)
    }

    pub fn count_calls(&self) -> usize {
        self.count_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WaitlistStore for InMemoryWaitlistStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn create(&self, signup: &NewSignup) -> AppResult<InsertOutcome> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(AppError::Storage("Failed to save to waitlist".into()));
        }

        let mut rows = self.rows.lock().unwrap();
        if rows.iter().any(|(_, email)| *email == signup.email) {
            return Ok(InsertOutcome::AlreadyExists);
        }
        let id = format!("rec{}", rows.len() + 1);
        rows.push((id.clone(), signup.email.clone()));
        Ok(InsertOutcome::Created(id))
    }

    async fn email_exists(&self, email: &str) -> AppResult<bool> {
        self.lookup_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(AppError::Network("connection refused".into()));
        }
        Ok(self.rows.lock().unwrap().iter().any(|(_, e)| e == email))
    }

    async fn count(&self) -> AppResult<u64> {
        self.count_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_counts.load(Ordering::SeqCst) {
            return Err(AppError::Network("connection refused".into()));
        }
        Ok(self.rows.lock().unwrap().len() as u64)
    }
}

/// Notifier that records every event it receives.
#[derive(Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<(String, NewSignup)>>,
}

impl RecordingNotifier {
    pub fn events(&self) -> Vec<(String, NewSignup)> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl SignupNotifier for RecordingNotifier {
    async fn signup_created(&self, record_id: &str, signup: &NewSignup) {
        self.events
            .lock()
            .unwrap()
            .push((record_id.to_string(), signup.clone()));
    }
}
