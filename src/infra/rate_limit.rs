use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use redis::{Script, aio::ConnectionManager};
use tokio::time::Instant;

use super::InfraError;
use crate::app_error::{AppError, AppResult};

/// Fixed-window limits on signup attempts.
#[async_trait]
pub trait RateLimiterTrait: Send + Sync {
    /// Count one attempt for `ip` and, when given, `email`.
    /// Fails with `AppError::RateLimited` once either window is exhausted.
    async fn check(&self, ip: &str, email: Option<&str>) -> AppResult<()>;
}

fn ip_key(ip: &str) -> String {
    format!("waitlist:rate:ip:{ip}")
}

fn email_key(email: &str) -> String {
    format!("waitlist:rate:email:{}", email.trim().to_lowercase())
}

/// INCR and start the window on first hit. Also repairs keys that lost
/// their TTL. Returns the count including this hit.
const INCR_WITH_TTL_SCRIPT: &str = r#"
local current = redis.call('INCR', KEYS[1])
if current == 1 then
    redis.call('EXPIRE', KEYS[1], ARGV[1])
elseif redis.call('TTL', KEYS[1]) == -1 then
    redis.call('EXPIRE', KEYS[1], ARGV[1])
end
return current
"#;

/// Redis-backed rate limiter, shared across API instances.
#[derive(Clone)]
pub struct RedisRateLimiter {
    manager: ConnectionManager,
    window_secs: u64,
    max_per_ip: u64,
    max_per_email: u64,
    script: Script,
}

impl RedisRateLimiter {
    pub async fn new(
        redis_url: &str,
        window_secs: u64,
        max_per_ip: u64,
        max_per_email: u64,
    ) -> Result<Self, InfraError> {
        let client = redis::Client::open(redis_url).map_err(InfraError::RedisConnection)?;
        let manager = ConnectionManager::new(client)
            .await
            .map_err(InfraError::RedisConnection)?;
        Ok(Self {
            manager,
            window_secs,
            max_per_ip,
            max_per_email,
            script: Script::new(INCR_WITH_TTL_SCRIPT),
        })
    }

    async fn bump(&self, conn: &mut ConnectionManager, key: &str, limit: u64) -> AppResult<()> {
        let current: u64 = self
            .script
            .key(key)
            .arg(self.window_secs)
            .invoke_async(conn)
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?;

        if current > limit {
            return Err(AppError::RateLimited);
        }

        Ok(())
    }
}

#[async_trait]
impl RateLimiterTrait for RedisRateLimiter {
    async fn check(&self, ip: &str, email: Option<&str>) -> AppResult<()> {
        let mut conn = self.manager.clone();
        self.bump(&mut conn, &ip_key(ip), self.max_per_ip).await?;

        if let Some(email) = email {
            self.bump(&mut conn, &email_key(email), self.max_per_email)
                .await?;
        }
        Ok(())
    }
}

/// Expired windows are swept once the map grows past this many keys, at most
/// once per window.
const SWEEP_THRESHOLD: usize = 10_000;

struct Windows {
    counters: HashMap<String, (Instant, u64)>,
    last_sweep: Instant,
}

/// Fixed-window limiter kept in process memory. Used when no Redis is
/// configured; limits are per instance.
pub struct InMemoryRateLimiter {
    window: Duration,
    max_per_ip: u64,
    max_per_email: u64,
    sweep_threshold: usize,
    windows: Mutex<Windows>,
}

impl InMemoryRateLimiter {
    pub fn new(window_secs: u64, max_per_ip: u64, max_per_email: u64) -> Self {
        Self {
            window: Duration::from_secs(window_secs),
            max_per_ip,
            max_per_email,
            sweep_threshold: SWEEP_THRESHOLD,
            windows: Mutex::new(Windows {
                counters: HashMap::new(),
                last_sweep: Instant::now(),
            }),
        }
    }

    fn bump(
        &self,
        counters: &mut HashMap<String, (Instant, u64)>,
        key: String,
        limit: u64,
    ) -> AppResult<()> {
        let now = Instant::now();
        let entry = counters.entry(key).or_insert((now, 0));
        if now.duration_since(entry.0) >= self.window {
            *entry = (now, 0);
        }
        entry.1 += 1;

        if entry.1 > limit {
            return Err(AppError::RateLimited);
        }
        Ok(())
    }

    fn maybe_sweep(&self, windows: &mut Windows) {
        let now = Instant::now();
        if windows.counters.len() <= self.sweep_threshold
            || now.duration_since(windows.last_sweep) < self.window
        {
            return;
        }
        let before = windows.counters.len();
        windows
            .counters
            .retain(|_, (started, _)| now.duration_since(*started) < self.window);
        windows.last_sweep = now;
        tracing::debug!(
            removed = before - windows.counters.len(),
            remaining = windows.counters.len(),
            "Swept expired rate limit windows"
        );
    }
}

#[async_trait]
impl RateLimiterTrait for InMemoryRateLimiter {
    async fn check(&self, ip: &str, email: Option<&str>) -> AppResult<()> {
        let mut windows = self
            .windows
            .lock()
            .map_err(|_| AppError::Internal("rate limiter lock poisoned".into()))?;

        self.maybe_sweep(&mut windows);

        self.bump(&mut windows.counters, ip_key(ip), self.max_per_ip)?;
        if let Some(email) = email {
            self.bump(&mut windows.counters, email_key(email), self.max_per_email)?;
        }
        Ok(())
    }
}
