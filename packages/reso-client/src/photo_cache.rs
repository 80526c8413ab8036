//! Process-lifetime photo URL cache.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Photo lists older than this are treated as absent.
pub const DEFAULT_PHOTO_CACHE_TTL: Duration = Duration::from_secs(30 * 60);

/// Time source for cache expiry.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Manually advanced clock for tests.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<Instant>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Arc::new(Mutex::new(Instant::now())),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

struct CacheEntry {
    urls: Vec<String>,
    written_at: Instant,
}

/// listing key → photo URLs, expiring after a fixed TTL.
///
/// An empty list is a valid cached value ("this listing has no photos").
/// Rate-limited fetches must never be written here.
pub struct PhotoCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl PhotoCache {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            clock,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cached URLs for `listing_key`, or `None` when absent or expired.
    pub fn get(&self, listing_key: &str) -> Option<Vec<String>> {
        let now = self.clock.now();
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries
            .get(listing_key)
            .filter(|entry| now.saturating_duration_since(entry.written_at) < self.ttl)
            .map(|entry| entry.urls.clone())
    }

    pub fn insert(&self, listing_key: &str, urls: Vec<String>) {
        let written_at = self.clock.now();
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(listing_key.to_string(), CacheEntry { urls, written_at });
    }

    /// Drop expired entries.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let before = entries.len();
        entries.retain(|_, entry| now.saturating_duration_since(entry.written_at) < self.ttl);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for PhotoCache {
    fn default() -> Self {
        Self::new(DEFAULT_PHOTO_CACHE_TTL, Arc::new(SystemClock))
    }
}
