//! Test utilities for unit and HTTP-level tests.
//!
//! - In-memory implementations of the store and notifier ports
//! - Test data factories
//! - `TestAppStateBuilder` for route tests
//! - Local stub servers for third-party HTTP APIs

pub mod app_state_builder;
pub mod factories;
pub mod store_mocks;
pub mod stub_server;

pub use app_state_builder::{TestAppStateBuilder, create_test_config};
pub use factories::{create_test_request, create_test_signup};
pub use store_mocks::{InMemoryWaitlistStore, RecordingNotifier};
pub use stub_server::spawn_stub_server;
