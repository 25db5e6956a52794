//! Generation-keyed response cache.
//!
//! Every resource carries a [`Generation`] marker. Cache keys embed the
//! marker, so bumping it on invalidation makes every older entry
//! unreachable without touching the store:
//!
//! - [`GenerationStore`]: per-resource generation markers
//! - [`ResponseCache`]: LRU + TTL store of fetched snapshots
//! - [`InFlightFetches`]: collapses concurrent misses into one fetch
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! ttl_seconds = 3600
//! max_entries = 256
//! sweep_interval_seconds = 60
//! warm_on_invalidate = true
//! coalesce_fetches = true
//! ```

mod config;
mod generation;
mod inflight;
mod keys;
mod lock;
mod store;

pub use config::CacheConfig;
pub use generation::{Generation, GenerationStore};
pub use inflight::{FetchResult, InFlightFetches};
pub use keys::{CacheKey, base_key, key_for};
pub use store::ResponseCache;
