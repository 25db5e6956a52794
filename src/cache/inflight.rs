//! Collapses concurrent upstream fetches for the same cache key.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures::future::{BoxFuture, FutureExt, Shared};
use metrics::counter;
use tracing::debug;

use crate::application::fetcher::FetchError;
use crate::domain::FeedSnapshot;

use super::keys::CacheKey;

const METRIC_FETCH_COALESCED_TOTAL: &str = "feedfront_fetch_coalesced_total";

pub type FetchResult = Result<Arc<FeedSnapshot>, FetchError>;
type SharedFetch = Shared<BoxFuture<'static, FetchResult>>;

/// At most one fetch per key is in flight; later callers await the same
/// future. Settled fetches are forgotten immediately, so a failure is only
/// ever seen by the callers that were already waiting for it.
#[derive(Default)]
pub struct InFlightFetches {
    fetches: Arc<DashMap<CacheKey, SharedFetch>>,
}

impl InFlightFetches {
    pub fn new() -> Self {
        Self::default()
    }

    /// Await the fetch running for `key`, starting it with `start` if none is.
    pub async fn run<F>(&self, key: &CacheKey, start: F) -> FetchResult
    where
        F: FnOnce() -> BoxFuture<'static, FetchResult>,
    {
        let fetch = match self.fetches.entry(key.clone()) {
            Entry::Occupied(entry) => {
                counter!(METRIC_FETCH_COALESCED_TOTAL).increment(1);
                debug!(key = %key, "joining in-flight fetch");
                entry.get().clone()
            }
            Entry::Vacant(entry) => {
                let fetch = start().shared();
                entry.insert(fetch.clone());
                fetch
            }
        };

        let _settle = SettleGuard {
            key: key.clone(),
            fetch: fetch.clone(),
            fetches: Arc::clone(&self.fetches),
        };

        fetch.await
    }

    /// Number of keys with a fetch currently in flight.
    pub fn len(&self) -> usize {
        self.fetches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fetches.is_empty()
    }
}

/// Removes the shared fetch once a waiter is done with it, whether it
/// settled or the waiter was dropped. A newer fetch under the same key is
/// left alone.
struct SettleGuard {
    key: CacheKey,
    fetch: SharedFetch,
    fetches: Arc<DashMap<CacheKey, SharedFetch>>,
}

impl Drop for SettleGuard {
    fn drop(&mut self) {
        self.fetches
            .remove_if(&self.key, |_, current| current.ptr_eq(&self.fetch));
    }
}
