//! Per-resource generation markers.
//!
//! The generation store is the only source of invalidation truth: bumping a
//! resource moves every cache key derived for it, and nothing else is ever
//! deleted.

use std::fmt;

use dashmap::DashMap;
use metrics::counter;
use serde::Serialize;
use tracing::debug;

use crate::domain::ResourceId;

const METRIC_GENERATION_BUMP_TOTAL: &str = "feedfront_generation_bump_total";

/// Monotonic marker gating cache-key freshness for one resource.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Generation(u64);

impl Generation {
    /// Marker of a resource that has never been invalidated.
    pub const EPOCH: Self = Self(0);

    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn get(self) -> u64 {
        self.0
    }

    fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Process-wide map from resource to its current generation.
///
/// Markers are not persisted; a restart resets every resource to
/// [`Generation::EPOCH`] together with the in-memory response cache.
#[derive(Debug, Default)]
pub struct GenerationStore {
    markers: DashMap<ResourceId, Generation>,
}

impl GenerationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current marker for `resource`, or the epoch if it was never bumped.
    pub fn current(&self, resource: &ResourceId) -> Generation {
        self.markers
            .get(resource)
            .map(|entry| *entry.value())
            .unwrap_or(Generation::EPOCH)
    }

    /// Advance the marker for `resource` and return the new value.
    ///
    /// The read-modify-write runs under the shard lock for the resource, so
    /// concurrent bumps never lose an increment.
    pub fn bump(&self, resource: &ResourceId) -> Generation {
        let generation = {
            let mut entry = self
                .markers
                .entry(resource.clone())
                .or_insert(Generation::EPOCH);
            *entry = entry.next();
            *entry
        };

        counter!(METRIC_GENERATION_BUMP_TOTAL).increment(1);
        debug!(
            resource = %resource,
            generation = generation.get(),
            "Generation bumped"
        );

        generation
    }

    /// Number of resources that have been bumped at least once.
    pub fn tracked(&self) -> usize {
        self.markers.len()
    }
}
