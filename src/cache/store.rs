//! In-memory response cache.
//!
//! Holds whole feed snapshots keyed by [`CacheKey`]. Entries are never
//! removed on invalidation; they become unreachable once the resource's
//! generation moves on and are reclaimed by TTL or LRU eviction.

use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use lru::LruCache;
use metrics::counter;
use tracing::debug;

use crate::domain::FeedSnapshot;

use super::config::CacheConfig;
use super::keys::CacheKey;
use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::store";
const METRIC_CACHE_HIT_TOTAL: &str = "feedfront_cache_hit_total";
const METRIC_CACHE_MISS_TOTAL: &str = "feedfront_cache_miss_total";
const METRIC_CACHE_EVICT_TOTAL: &str = "feedfront_cache_evict_total";
const METRIC_CACHE_EXPIRED_TOTAL: &str = "feedfront_cache_expired_total";

struct CachedEntry {
    snapshot: Arc<FeedSnapshot>,
    stored_at: Instant,
    ttl: Duration,
}

impl CachedEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.stored_at) >= self.ttl
    }
}

pub struct ResponseCache {
    entries: RwLock<LruCache<CacheKey, CachedEntry>>,
}

impl ResponseCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            entries: RwLock::new(LruCache::new(config.max_entries_non_zero())),
        }
    }

    /// Live snapshot stored under `key`, if any. Expired entries count as a
    /// miss and are dropped on the spot.
    pub fn get(&self, key: &CacheKey) -> Option<Arc<FeedSnapshot>> {
        let now = Instant::now();
        let mut entries = rw_write(&self.entries, SOURCE, "get");

        let expired = match entries.get(key) {
            Some(entry) if !entry.is_expired(now) => {
                counter!(METRIC_CACHE_HIT_TOTAL).increment(1);
                debug!(cache = "response", outcome = "hit", key = %key);
                return Some(Arc::clone(&entry.snapshot));
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            entries.pop(key);
            counter!(METRIC_CACHE_EXPIRED_TOTAL).increment(1);
        }

        counter!(METRIC_CACHE_MISS_TOTAL).increment(1);
        debug!(cache = "response", outcome = "miss", key = %key, expired);
        None
    }

    /// Store `snapshot` under `key`, overwriting any live value.
    pub fn put(&self, key: CacheKey, snapshot: Arc<FeedSnapshot>, ttl: Duration) {
        let entry = CachedEntry {
            snapshot,
            stored_at: Instant::now(),
            ttl,
        };

        let displaced = rw_write(&self.entries, SOURCE, "put").push(key.clone(), entry);
        if let Some((evicted, _)) = displaced {
            if evicted != key {
                counter!(METRIC_CACHE_EVICT_TOTAL).increment(1);
                debug!(cache = "response", evicted = %evicted, "capacity eviction");
            }
        }
    }

    /// Drop every expired entry and return how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = rw_write(&self.entries, SOURCE, "purge_expired");

        let expired: Vec<CacheKey> = entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            entries.pop(key);
        }

        if !expired.is_empty() {
            counter!(METRIC_CACHE_EXPIRED_TOTAL).increment(expired.len() as u64);
        }
        expired.len()
    }

    pub fn len(&self) -> usize {
        rw_read(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
