use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use pitchnode_types::SubmitRequest;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::instrument;

use crate::{
    app_error::AppResult,
    domain::entities::signup::{NewSignup, SignupReceipt},
};

/// Result of inserting a signup into a record store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    Created(String),
    /// The store itself refused a second row for this email.
    AlreadyExists,
}

/// A third-party record store holding waitlist signups.
#[async_trait]
pub trait WaitlistStore: Send + Sync {
    /// Short backend name for logs and the health endpoint.
    fn backend(&self) -> &'static str;

    async fn create(&self, signup: &NewSignup) -> AppResult<InsertOutcome>;

    /// `email` is already normalized.
    async fn email_exists(&self, email: &str) -> AppResult<bool>;

    /// Number of signup records in the store, without the base offset.
    async fn count(&self) -> AppResult<u64>;
}

/// Receives newly created signups. Implementations must not block the caller
/// on delivery.
#[async_trait]
pub trait SignupNotifier: Send + Sync {
    async fn signup_created(&self, record_id: &str, signup: &NewSignup);
}

/// Count reported by `GET /api/waitlist-count`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountSnapshot {
    pub count: u64,
    pub from_cache: bool,
    /// Set when the store could not be queried and a fallback value was used.
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy)]
struct CachedCount {
    value: u64,
    fetched_at: Instant,
    invalidated: bool,
}

#[derive(Debug, Default)]
struct CacheSlot {
    entry: Option<CachedCount>,
    /// Bumped by every `invalidate`.
    generation: u64,
}

/// Single-value TTL cache for the waitlist count.
///
/// An expired or invalidated entry is still kept as the fallback when the
/// store is unreachable. Refreshes carry the generation they started at, so a
/// count read before an invalidation is never stored as fresh.
pub struct CountCache {
    ttl: Duration,
    slot: RwLock<CacheSlot>,
}

impl CountCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: RwLock::new(CacheSlot::default()),
        }
    }

    pub async fn fresh(&self) -> Option<u64> {
        let entry = self.slot.read().await.entry;
        entry
            .filter(|c| !c.invalidated && c.fetched_at.elapsed() < self.ttl)
            .map(|c| c.value)
    }

    pub async fn last_known(&self) -> Option<u64> {
        self.slot.read().await.entry.map(|c| c.value)
    }

    /// Generation to pass to `store` once the refresh completes.
    pub async fn generation(&self) -> u64 {
        self.slot.read().await.generation
    }

    /// Stores `value` unless the cache was invalidated after `generation` was
    /// read. Returns whether the value was kept.
    pub async fn store(&self, value: u64, generation: u64) -> bool {
        let mut slot = self.slot.write().await;
        if slot.generation != generation {
            return false;
        }
        slot.entry = Some(CachedCount {
            value,
            fetched_at: Instant::now(),
            invalidated: false,
        });
        true
    }

    pub async fn invalidate(&self) {
        let mut slot = self.slot.write().await;
        slot.generation = slot.generation.wrapping_add(1);
        if let Some(entry) = slot.entry.as_mut() {
            entry.invalidated = true;
        }
    }
}

pub struct WaitlistUseCases {
    store: Arc<dyn WaitlistStore>,
    notifier: Arc<dyn SignupNotifier>,
    cache: CountCache,
    refresh_lock: Mutex<()>,
    base_count: u64,
}

impl WaitlistUseCases {
    pub fn new(
        store: Arc<dyn WaitlistStore>,
        notifier: Arc<dyn SignupNotifier>,
        cache_ttl: Duration,
        base_count: u64,
    ) -> Self {
        Self {
            store,
            notifier,
            cache: CountCache::new(cache_ttl),
            refresh_lock: Mutex::new(()),
            base_count,
        }
    }

    pub fn backend(&self) -> &'static str {
        self.store.backend()
    }

    /// Validate, de-duplicate and persist a signup.
    ///
    /// A duplicate email is not an error: the caller gets a receipt with
    /// `is_duplicate` set and nothing is written.
    #[instrument(skip_all, fields(backend = self.store.backend()))]
    pub async fn submit_signup(&self, req: &SubmitRequest) -> AppResult<SignupReceipt> {
        let signup = NewSignup::from_request(req)?;

        let exists = match self.store.email_exists(&signup.email).await {
            Ok(exists) => exists,
            Err(e) => {
                // Treated as a miss.
                tracing::warn!(error = %e, "Duplicate check failed, continuing with insert");
                false
            }
        };

        if exists {
            tracing::info!(email = %signup.email, "Email already on the waitlist");
            return Ok(SignupReceipt::duplicate());
        }

        match self.store.create(&signup).await? {
            InsertOutcome::AlreadyExists => {
                tracing::info!(email = %signup.email, "Store reported existing signup");
                Ok(SignupReceipt::duplicate())
            }
            InsertOutcome::Created(record_id) => {
                tracing::info!(record_id = %record_id, email = %signup.email, "Created waitlist signup");
                self.cache.invalidate().await;
                self.notifier.signup_created(&record_id, &signup).await;
                Ok(SignupReceipt::created(record_id))
            }
        }
    }

    /// Current waitlist size including the base offset. Never fails: when the
    /// store is unreachable the last known value (or the base count) is
    /// returned with `error` set.
    pub async fn waitlist_count(&self) -> CountSnapshot {
        if let Some(count) = self.cache.fresh().await {
            return CountSnapshot {
                count,
                from_cache: true,
                error: None,
            };
        }

        // One refresh at a time; callers that waited pick up the fresh value.
        let _guard = self.refresh_lock.lock().await;
        if let Some(count) = self.cache.fresh().await {
            return CountSnapshot {
                count,
                from_cache: true,
                error: None,
            };
        }

        let generation = self.cache.generation().await;
        match self.store.count().await {
            Ok(records) => {
                let count = self.base_count.saturating_add(records);
                tracing::info!(
                    backend = self.store.backend(),
                    records,
                    base_count = self.base_count,
                    count,
                    "Refreshed waitlist count"
                );
                if !self.cache.store(count, generation).await {
                    tracing::debug!(count, "Count cache invalidated during refresh, not caching");
                }
                CountSnapshot {
                    count,
                    from_cache: false,
                    error: None,
                }
            }
            Err(e) => {
                tracing::error!(backend = self.store.backend(), error = %e, "Failed to fetch waitlist count");
                let count = self.cache.last_known().await.unwrap_or(self.base_count);
                CountSnapshot {
                    count,
                    from_cache: false,
                    error: Some("Failed to fetch count".to_string()),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_error::AppError;
    use crate::test_utils::{InMemoryWaitlistStore, RecordingNotifier, create_test_request};
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::sync::Notify;

    const TTL: Duration = Duration::from_secs(5);

    fn use_cases(
        store: Arc<InMemoryWaitlistStore>,
        notifier: Arc<RecordingNotifier>,
        base: u64,
    ) -> WaitlistUseCases {
        WaitlistUseCases::new(store, notifier, TTL, base)
    }

    #[tokio::test]
    async fn submit_creates_record_and_notifies() {
        let store = Arc::new(InMemoryWaitlistStore::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let uc = use_cases(store.clone(), notifier.clone(), 0);

        let receipt = uc
            .submit_signup(&create_test_request(|r| r.email = " New@Example.com ".to_string()))
            .await
            .unwrap();

        assert!(!receipt.is_duplicate);
        assert!(receipt.record_id.is_some());
        assert_eq!(store.emails(), vec!["new@example.com".to_string()]);
        assert_eq!(notifier.events().len(), 1);
        assert_eq!(notifier.events()[0].1.email, "new@example.com");
    }

    #[tokio::test]
    async fn submit_duplicate_is_success_without_write() {
        let store = Arc::new(InMemoryWaitlistStore::with_emails(&["taken@example.com"]));
        let notifier = Arc::new(RecordingNotifier::default());
        let uc = use_cases(store.clone(), notifier.clone(), 0);

        let receipt = uc
            .submit_signup(&create_test_request(|r| r.email = "TAKEN@example.com".to_string()))
            .await
            .unwrap();

        assert_eq!(receipt, SignupReceipt::duplicate());
        assert_eq!(store.emails().len(), 1);
        assert!(notifier.events().is_empty());
    }

    #[tokio::test]
    async fn submit_rejects_invalid_input_before_touching_store() {
        let store = Arc::new(InMemoryWaitlistStore::new());
        let uc = use_cases(store.clone(), Arc::new(RecordingNotifier::default()), 0);

        let err = uc
            .submit_signup(&create_test_request(|r| r.name = "A".to_string()))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InvalidInput(msg) if msg == "Name must be at least 2 characters"));
        assert_eq!(store.lookup_calls(), 0);
    }

    #[tokio::test]
    async fn failed_duplicate_check_still_inserts() {
        let store = Arc::new(InMemoryWaitlistStore::new());
        store.fail_lookups(true);
        let uc = use_cases(store.clone(), Arc::new(RecordingNotifier::default()), 0);

        let receipt = uc.submit_signup(&create_test_request(|_| {})).await.unwrap();

        assert!(!receipt.is_duplicate);
        assert_eq!(store.emails().len(), 1);
    }

    #[tokio::test]
    async fn store_level_conflict_reports_duplicate() {
        let store = Arc::new(InMemoryWaitlistStore::with_emails(&["ada@example.com"]));
        // Lookup misses but the insert hits the unique constraint.
        store.fail_lookups(true);
        let notifier = Arc::new(RecordingNotifier::default());
        let uc = use_cases(store.clone(), notifier.clone(), 0);

        let receipt = uc
            .submit_signup(&create_test_request(|r| r.email = "ada@example.com".to_string()))
            .await
            .unwrap();

        assert!(receipt.is_duplicate);
        assert!(notifier.events().is_empty());
    }

    #[tokio::test]
    async fn insert_failure_propagates() {
        let store = Arc::new(InMemoryWaitlistStore::new());
        store.fail_inserts(true);
        let notifier = Arc::new(RecordingNotifier::default());
        let uc = use_cases(store, notifier.clone(), 0);

        let err = uc.submit_signup(&create_test_request(|_| {})).await.unwrap_err();

        assert!(matches!(err, AppError::Storage(_)));
        assert!(notifier.events().is_empty());
    }

    #[tokio::test]
    async fn count_adds_base_and_caches() {
        let store = Arc::new(InMemoryWaitlistStore::with_emails(&["a@example.com", "b@example.com"]));
        let uc = use_cases(store.clone(), Arc::new(RecordingNotifier::default()), 27);

        let first = uc.waitlist_count().await;
        assert_eq!(first.count, 29);
        assert!(!first.from_cache);

        let second = uc.waitlist_count().await;
        assert_eq!(second.count, 29);
        assert!(second.from_cache);
        assert_eq!(store.count_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn count_refreshes_after_ttl() {
        let store = Arc::new(InMemoryWaitlistStore::with_emails(&["a@example.com"]));
        let uc = use_cases(store.clone(), Arc::new(RecordingNotifier::default()), 0);

        assert_eq!(uc.waitlist_count().await.count, 1);
        store.insert_raw("b@example.com");
        assert_eq!(uc.waitlist_count().await.count, 1);

        tokio::time::advance(TTL + Duration::from_millis(1)).await;
        let refreshed = uc.waitlist_count().await;
        assert_eq!(refreshed.count, 2);
        assert!(!refreshed.from_cache);
    }

    #[tokio::test]
    async fn new_signup_invalidates_count_cache() {
        let store = Arc::new(InMemoryWaitlistStore::new());
        let uc = use_cases(store.clone(), Arc::new(RecordingNotifier::default()), 10);

        assert_eq!(uc.waitlist_count().await.count, 10);
        uc.submit_signup(&create_test_request(|_| {})).await.unwrap();
        assert_eq!(uc.waitlist_count().await.count, 11);
    }

    #[tokio::test]
    async fn count_failure_falls_back_to_base() {
        let store = Arc::new(InMemoryWaitlistStore::new());
        store.fail_counts(true);
        let uc = use_cases(store, Arc::new(RecordingNotifier::default()), 18);

        let snapshot = uc.waitlist_count().await;
        assert_eq!(snapshot.count, 18);
        assert_eq!(snapshot.error.as_deref(), Some("Failed to fetch count"));
    }

    #[tokio::test(start_paused = true)]
    async fn count_failure_falls_back_to_last_known_value() {
        let store = Arc::new(InMemoryWaitlistStore::with_emails(&["a@example.com", "b@example.com"]));
        let uc = use_cases(store.clone(), Arc::new(RecordingNotifier::default()), 18);

        assert_eq!(uc.waitlist_count().await.count, 20);

        tokio::time::advance(TTL * 2).await;
        store.fail_counts(true);

        let snapshot = uc.waitlist_count().await;
        assert_eq!(snapshot.count, 20);
        assert!(snapshot.error.is_some());
    }

    #[tokio::test]
    async fn count_saturates_at_u64_max() {
        let store = Arc::new(InMemoryWaitlistStore::with_emails(&["a@example.com"]));
        let uc = use_cases(store, Arc::new(RecordingNotifier::default()), u64::MAX);

        assert_eq!(uc.waitlist_count().await.count, u64::MAX);
    }

    /// Holds its first `count()` after reading the rows until released.
    struct GatedStore {
        inner: InMemoryWaitlistStore,
        gate_next_count: AtomicBool,
        entered: Notify,
        release: Notify,
    }

    #[async_trait]
    impl WaitlistStore for GatedStore {
        fn backend(&self) -> &'static str {
            "gated"
        }

        async fn create(&self, signup: &NewSignup) -> AppResult<InsertOutcome> {
            self.inner.create(signup).await
        }

        async fn email_exists(&self, email: &str) -> AppResult<bool> {
            self.inner.email_exists(email).await
        }

        async fn count(&self) -> AppResult<u64> {
            let records = self.inner.count().await?;
            if self.gate_next_count.swap(false, Ordering::SeqCst) {
                self.entered.notify_one();
                self.release.notified().await;
            }
            Ok(records)
        }
    }

    #[tokio::test]
    async fn signup_during_refresh_is_not_masked_by_stale_count() {
        let store = Arc::new(GatedStore {
            inner: InMemoryWaitlistStore::new(),
            gate_next_count: AtomicBool::new(true),
            entered: Notify::new(),
            release: Notify::new(),
        });
        let uc = Arc::new(WaitlistUseCases::new(
            store.clone(),
            Arc::new(RecordingNotifier::default()),
            TTL,
            0,
        ));

        let refresh = tokio::spawn({
            let uc = uc.clone();
            async move { uc.waitlist_count().await }
        });
        store.entered.notified().await;

        uc.submit_signup(&create_test_request(|_| {})).await.unwrap();
        store.release.notify_one();

        // The in-flight refresh still answers with what it read.
        assert_eq!(refresh.await.unwrap().count, 0);

        let after = uc.waitlist_count().await;
        assert_eq!(after.count, 1);
        assert!(!after.from_cache);
    }

    #[tokio::test]
    async fn cache_drops_value_from_before_invalidation() {
        let cache = CountCache::new(TTL);
        let generation = cache.generation().await;
        cache.invalidate().await;

        assert!(!cache.store(5, generation).await);
        assert_eq!(cache.fresh().await, None);

        let generation = cache.generation().await;
        assert!(cache.store(6, generation).await);
        assert_eq!(cache.fresh().await, Some(6));
    }
}
