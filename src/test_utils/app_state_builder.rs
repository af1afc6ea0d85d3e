//! Test app state builder for HTTP-level testing.
//!
//! `TestAppStateBuilder` creates an `AppState` backed by in-memory ports.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderValue;

use crate::{
    adapters::http::app_state::AppState,
    application::use_cases::waitlist::{SignupNotifier, WaitlistStore, WaitlistUseCases},
    infra::{
        config::{AppConfig, WaitlistBackend},
        rate_limit::InMemoryRateLimiter,
    },
    test_utils::{InMemoryWaitlistStore, RecordingNotifier},
};

/// Build a config that needs no environment. Tests mutate fields as needed.
pub fn create_test_config() -> AppConfig {
    AppConfig {
        bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
        cors_origin: HeaderValue::from_static("http://localhost:3000"),
        trust_proxy: false,
        backend: WaitlistBackend::Simulated,
        airtable: None,
        supabase: None,
        database_url: None,
        base_count: 0,
        count_cache_ttl: Duration::from_secs(10),
        webhook_urls: vec![],
        webhook_secret: None,
        redis_url: None,
        rate_limit_window_secs: 60,
        rate_limit_per_ip: 1_000,
        rate_limit_per_email: 1_000,
    }
}

pub struct TestAppStateBuilder {
    config: AppConfig,
    store: Option<Arc<dyn WaitlistStore>>,
    notifier: Option<Arc<dyn SignupNotifier>>,
}

impl Default for TestAppStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestAppStateBuilder {
    pub fn new() -> Self {
        Self {
            config: create_test_config(),
            store: None,
            notifier: None,
        }
    }

    pub fn with_store(mut self, store: Arc<dyn WaitlistStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn SignupNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn with_base_count(mut self, base_count: u64) -> Self {
        self.config.base_count = base_count;
        self
    }

    pub fn with_rate_limit(mut self, per_ip: u64, per_email: u64) -> Self {
        self.config.rate_limit_per_ip = per_ip;
        self.config.rate_limit_per_email = per_email;
        self
    }

    pub fn with_trust_proxy(mut self, trust_proxy: bool) -> Self {
        self.config.trust_proxy = trust_proxy;
        self
    }

    pub fn build(self) -> AppState {
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(InMemoryWaitlistStore::new()));
        let notifier = self
            .notifier
            .unwrap_or_else(|| Arc::new(RecordingNotifier::default()));

        let rate_limiter = Arc::new(InMemoryRateLimiter::new(
            self.config.rate_limit_window_secs,
            self.config.rate_limit_per_ip,
            self.config.rate_limit_per_email,
        ));

        let waitlist_use_cases = WaitlistUseCases::new(
            store,
            notifier,
            self.config.count_cache_ttl,
            self.config.base_count,
        );

        AppState {
            config: Arc::new(self.config),
            waitlist_use_cases: Arc::new(waitlist_use_cases),
            rate_limiter,
        }
    }
}
