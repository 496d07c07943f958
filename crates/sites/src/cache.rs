//! In-memory site cache with TTL
//!
//! Caches host lookups so repeated requests for the same custom domain do
//! not hit the API. Lookup errors are never stored.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use crate::resolver::ResolvedSite;

/// Default cache TTL (1 minute)
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60);

#[derive(Clone)]
struct CacheEntry {
    site: Option<ResolvedSite>,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self) -> bool {
        Instant::now() > self.expires_at
    }
}

/// Thread-safe host cache
pub struct SiteCache {
    /// Normalized host -> site (`None` means the host must not be served)
    cache: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl Default for SiteCache {
    fn default() -> Self {
        Self::with_ttl(DEFAULT_CACHE_TTL)
    }
}

impl SiteCache {
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            cache: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Returns `Some(Some(site))` for a servable host, `Some(None)` for a
    /// host cached as not servable, and `None` if absent or expired.
    pub fn get(&self, host: &str) -> Option<Option<ResolvedSite>> {
        let cache = self.cache.read().ok()?;
        let entry = cache.get(host)?;

        if entry.is_expired() {
            None
        } else {
            Some(entry.site.clone())
        }
    }

    pub fn set(&self, host: &str, site: Option<ResolvedSite>) {
        if let Ok(mut cache) = self.cache.write() {
            cache.insert(
                host.to_string(),
                CacheEntry {
                    site,
                    expires_at: Instant::now() + self.ttl,
                },
            );
        }
    }

    /// Drop expired entries
    pub fn cleanup(&self) {
        if let Ok(mut cache) = self.cache.write() {
            cache.retain(|_, entry| !entry.is_expired());
        }
    }

    pub fn len(&self) -> usize {
        self.cache.read().map(|c| c.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
