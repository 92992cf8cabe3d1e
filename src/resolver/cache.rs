//! Domain resolution caching.

use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::observability::metrics;
use crate::resolver::clock::{Clock, SystemClock};

/// Default lifetime of a cached resolution.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Longest lifetime a cached resolution may have.
pub const MAX_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// A cached domain → username mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub username: String,
    pub expires_at: Instant,
}

impl CacheEntry {
    /// An entry is usable only strictly before its expiry.
    pub fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Point-in-time view of one entry, for the admin API.
#[derive(Debug, Clone, Serialize)]
pub struct CacheEntrySnapshot {
    pub domain: String,
    pub username: String,
    pub expires_in_secs: u64,
    pub live: bool,
}

/// A thread-safe, TTL-bounded cache of resolved custom domains.
///
/// Entries are overwritten on every successful resolution and never removed;
/// an expired entry reads as absent until it is re-resolved.
#[derive(Clone)]
pub struct ResolutionCache {
    inner: Arc<DashMap<String, CacheEntry>>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl ResolutionCache {
    /// Create an empty cache backed by the system clock.
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    /// TTLs above [`MAX_TTL`] are capped.
    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
            clock,
            ttl: ttl.min(MAX_TTL),
        }
    }

    /// Look up a live username. Never performs I/O.
    pub fn get(&self, domain: &str) -> Option<String> {
        let now = self.clock.now();
        self.inner
            .get(domain)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.username.clone())
    }

    /// Raw entry, live or not.
    pub fn entry(&self, domain: &str) -> Option<CacheEntry> {
        self.inner.get(domain).map(|r| r.value().clone())
    }

    /// Store a fresh resolution, replacing whatever was there.
    pub fn insert(&self, domain: &str, username: &str) -> CacheEntry {
        let now = self.clock.now();
        let entry = CacheEntry {
            username: username.to_string(),
            // An unrepresentable expiry leaves the entry already stale.
            expires_at: now.checked_add(self.ttl).unwrap_or(now),
        };
        self.inner.insert(domain.to_string(), entry.clone());
        metrics::record_cache_size(self.inner.len());
        entry
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Snapshot every entry, sorted by domain.
    pub fn snapshot(&self) -> Vec<CacheEntrySnapshot> {
        let now = self.clock.now();
        let mut entries: Vec<_> = self
            .inner
            .iter()
            .map(|r| CacheEntrySnapshot {
                domain: r.key().clone(),
                username: r.value().username.clone(),
                expires_in_secs: r.value().expires_at.saturating_duration_since(now).as_secs(),
                live: r.value().is_live(now),
            })
            .collect();
        entries.sort_by(|a, b| a.domain.cmp(&b.domain));
        entries
    }
}
