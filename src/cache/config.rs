//! Response cache configuration.
//!
//! Built from the validated `[cache]` settings via `From<&CacheSettings>`.

use std::num::NonZeroUsize;
use std::time::Duration;

const DEFAULT_TTL_SECS: u64 = 60 * 60;
const DEFAULT_MAX_ENTRIES: usize = 256;
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Lifetime of a cached snapshot, in seconds.
    pub ttl_seconds: u64,
    /// Maximum snapshots held before LRU eviction.
    pub max_entries: usize,
    /// How often expired snapshots are swept, in seconds.
    pub sweep_interval_seconds: u64,
    /// Refetch a resource right after a direct or webhook invalidation.
    pub warm_on_invalidate: bool,
    /// Share one upstream fetch between concurrent misses on the same key.
    pub coalesce_fetches: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: DEFAULT_TTL_SECS,
            max_entries: DEFAULT_MAX_ENTRIES,
            sweep_interval_seconds: DEFAULT_SWEEP_INTERVAL_SECS,
            warm_on_invalidate: true,
            coalesce_fetches: true,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            ttl_seconds: settings.ttl.as_secs(),
            max_entries: settings.max_entries.get(),
            sweep_interval_seconds: settings.sweep_interval.as_secs(),
            warm_on_invalidate: settings.warm_on_invalidate,
            coalesce_fetches: settings.coalesce_fetches,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }

    /// Sweep cadence, never shorter than one second.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_seconds.max(1))
    }

    /// Returns the entry limit as NonZeroUsize, clamping to 1 if zero.
    pub fn max_entries_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.max_entries).unwrap_or(NonZeroUsize::MIN)
    }
}
