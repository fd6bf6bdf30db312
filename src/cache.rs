//! Time-windowed memoization of upstream responses.
//!
//! Entries are keyed by endpoint plus a sorted parameter map, so the order in
//! which a caller assembled its parameters never causes a miss. An entry older
//! than the staleness window is treated as absent. Nothing is evicted
//! proactively: the map grows with the number of distinct keys seen during the
//! process lifetime.
use chrono::{DateTime, TimeDelta, Utc};
use serde_json::Value;
use std::{collections::BTreeMap, collections::HashMap, future::Future, sync::Arc};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::FetchError;

pub const STALE_AFTER_SECS: i64 = 5 * 60;

/// Query parameters of one upstream call, kept sorted by name.
pub type Params = BTreeMap<String, String>;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub endpoint: String,
    pub params: Params,
}

impl CacheKey {
    pub fn new(endpoint: &str, params: &Params) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            params: params.clone(),
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    payload: Value,
    fetched_at: DateTime<Utc>,
}

pub struct RequestCache {
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
    clock: Arc<dyn Clock>,
    stale_after: TimeDelta,
}

impl Default for RequestCache {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl RequestCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_window(clock, TimeDelta::seconds(STALE_AFTER_SECS))
    }

    pub fn with_window(clock: Arc<dyn Clock>, stale_after: TimeDelta) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
            stale_after,
        }
    }

    /// Returns the cached payload for `(endpoint, params)` when it is younger
    /// than the staleness window, otherwise runs `fetch` and stores its result.
    /// Failed fetches are not cached.
    pub async fn get_or_fetch<F, Fut>(
        &self,
        endpoint: &str,
        params: &Params,
        fetch: F,
    ) -> Result<Value, FetchError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, FetchError>>,
    {
        let key = CacheKey::new(endpoint, params);
        {
            let guard = self.entries.lock().await;
            if let Some(entry) = guard.get(&key) {
                let age = self.clock.now().signed_duration_since(entry.fetched_at);
                if age < self.stale_after {
                    debug!(endpoint, "cache hit");
                    return Ok(entry.payload.clone());
                }
                debug!(endpoint, age_secs = age.num_seconds(), "cache entry stale");
            }
        }

        debug!(endpoint, "cache miss, fetching");
        let payload = fetch().await?;

        let mut guard = self.entries.lock().await;
        guard.insert(
            key,
            CacheEntry {
                payload: payload.clone(),
                fetched_at: self.clock.now(),
            },
        );
        Ok(payload)
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}
