//! Cache-first domain resolution.

use std::sync::Arc;
use std::time::Instant;

use crate::observability::metrics;
use crate::resolver::cache::ResolutionCache;
use crate::resolver::types::{DomainLookup, Resolution};

/// Resolves custom hostnames to tenants, consulting the cache before the remote.
///
/// Only successful lookups are cached. Concurrent misses for the same domain
/// each go to the remote; the last write wins.
#[derive(Clone)]
pub struct DomainResolver {
    cache: ResolutionCache,
    lookup: Arc<dyn DomainLookup>,
}

impl DomainResolver {
    pub fn new(cache: ResolutionCache, lookup: Arc<dyn DomainLookup>) -> Self {
        Self { cache, lookup }
    }

    pub fn cache(&self) -> &ResolutionCache {
        &self.cache
    }

    /// Resolve a normalized hostname.
    pub async fn resolve(&self, domain: &str) -> Resolution {
        if let Some(username) = self.cache.get(domain) {
            metrics::record_cache_lookup(true);
            tracing::trace!(domain, username = %username, "Resolution cache hit");
            return Resolution::Resolved { username };
        }
        metrics::record_cache_lookup(false);

        let started = Instant::now();
        match self.lookup.lookup(domain).await {
            Ok(username) => {
                metrics::record_remote_lookup("resolved", started);
                self.cache.insert(domain, &username);
                tracing::debug!(domain, username = %username, "Custom domain resolved");
                Resolution::Resolved { username }
            }
            Err(e) => {
                metrics::record_remote_lookup(e.kind(), started);
                tracing::debug!(domain, error = %e, "Custom domain unresolved");
                Resolution::Unresolved
            }
        }
    }
}
