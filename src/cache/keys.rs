//! Cache key derivation.
//!
//! A key names one generation of one resource. Pagination parameters are
//! left out: the cached value is the whole feed and every page
//! of a response is cut from the same generation.

use std::fmt;

use crate::application::pagination::PageQuery;
use crate::domain::ResourceId;

use super::generation::{Generation, GenerationStore};

/// Address of a cached feed snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    resource: ResourceId,
    generation: Generation,
}

impl CacheKey {
    pub fn new(resource: ResourceId, generation: Generation) -> Self {
        Self {
            resource,
            generation,
        }
    }

    pub fn resource(&self) -> &ResourceId {
        &self.resource
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "feed:{}:g{}", self.resource, self.generation)
    }
}

/// Key under which the response for `(resource, query)` is cached right now.
///
/// `query` does not take part in the key.
pub fn key_for(store: &GenerationStore, resource: &ResourceId, _query: &PageQuery) -> CacheKey {
    base_key(store, resource)
}

/// Key for the current generation of `resource`, independent of any page.
pub fn base_key(store: &GenerationStore, resource: &ResourceId) -> CacheKey {
    CacheKey::new(resource.clone(), store.current(resource))
}
