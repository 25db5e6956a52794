//! Cache-through read path for feeds.

use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::application::fetcher::{FetchError, ResourceFetcher};
use crate::application::pagination::{PageQuery, PaginationError, paginate};
use crate::cache::{
    CacheConfig, CacheKey, FetchResult, Generation, GenerationStore, InFlightFetches,
    ResponseCache, base_key, key_for,
};
use crate::domain::{DomainError, FeedItem, FeedSnapshot, ResourceId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedError {
    #[error("{0}")]
    InvalidResource(DomainError),
    #[error(transparent)]
    InvalidQuery(#[from] PaginationError),
    #[error("item `{item}` not found in `{resource}`")]
    ItemNotFound { resource: ResourceId, item: String },
    #[error(transparent)]
    Upstream(#[from] FetchError),
}

impl From<DomainError> for FeedError {
    fn from(error: DomainError) -> Self {
        Self::InvalidResource(error)
    }
}

/// One page of a feed, cut from the cached snapshot of the generation it
/// was read under.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedPage {
    pub title: String,
    pub description: Option<String>,
    pub items: Vec<FeedItem>,
    pub page: u32,
    pub limit: u32,
    pub total_items: usize,
    pub total_pages: usize,
    pub generation: Generation,
}

pub struct FeedService {
    fetcher: Arc<dyn ResourceFetcher>,
    generations: Arc<GenerationStore>,
    cache: Arc<ResponseCache>,
    inflight: InFlightFetches,
    config: CacheConfig,
}

impl FeedService {
    pub fn new(
        fetcher: Arc<dyn ResourceFetcher>,
        generations: Arc<GenerationStore>,
        cache: Arc<ResponseCache>,
        config: CacheConfig,
    ) -> Self {
        Self {
            fetcher,
            generations,
            cache,
            inflight: InFlightFetches::new(),
            config,
        }
    }

    pub fn generations(&self) -> &Arc<GenerationStore> {
        &self.generations
    }

    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    #[instrument(skip(self, resource, query), fields(resource = %resource, page = query.page(), limit = query.limit()))]
    pub async fn page(&self, resource: &ResourceId, query: PageQuery) -> Result<FeedPage, FeedError> {
        let key = key_for(&self.generations, resource, &query);
        let snapshot = self.load(&key).await?;
        let slice = paginate(&snapshot.items, query);
        let total_pages = slice.total_pages();

        Ok(FeedPage {
            title: snapshot.title.clone(),
            description: snapshot.description.clone(),
            items: slice.items.to_vec(),
            page: slice.page,
            limit: slice.limit,
            total_items: slice.total_items,
            total_pages,
            generation: key.generation(),
        })
    }

    /// Look up a single item by id or slug in the current snapshot.
    #[instrument(skip(self, resource), fields(resource = %resource))]
    pub async fn item(&self, resource: &ResourceId, id_or_slug: &str) -> Result<FeedItem, FeedError> {
        let key = base_key(&self.generations, resource);
        let snapshot = self.load(&key).await?;
        snapshot
            .find_item(id_or_slug)
            .cloned()
            .ok_or_else(|| FeedError::ItemNotFound {
                resource: resource.clone(),
                item: id_or_slug.to_string(),
            })
    }

    /// Populate the cache for the resource's current generation.
    ///
    /// A snapshot already cached under that generation is left in place.
    pub async fn warm(&self, resource: &ResourceId) -> Result<CacheKey, FeedError> {
        let key = base_key(&self.generations, resource);
        self.load(&key).await?;
        debug!(key = %key, "cache warmed");
        Ok(key)
    }

    async fn load(&self, key: &CacheKey) -> Result<Arc<FeedSnapshot>, FeedError> {
        if let Some(snapshot) = self.cache.get(key) {
            return Ok(snapshot);
        }

        let snapshot = if self.config.coalesce_fetches {
            self.inflight
                .run(key, || self.fetch_and_store(key.clone()))
                .await?
        } else {
            self.fetch_and_store(key.clone()).await?
        };
        Ok(snapshot)
    }

    // Failures are returned to the waiting callers and never cached.
    fn fetch_and_store(&self, key: CacheKey) -> BoxFuture<'static, FetchResult> {
        let fetcher = Arc::clone(&self.fetcher);
        let cache = Arc::clone(&self.cache);
        let ttl = self.config.ttl();

        async move {
            let snapshot = Arc::new(fetcher.fetch(key.resource()).await?);
            cache.put(key, Arc::clone(&snapshot), ttl);
            Ok(snapshot)
        }
        .boxed()
    }
}
