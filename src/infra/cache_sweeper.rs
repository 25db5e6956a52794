use std::{sync::Arc, time::Duration};

use metrics::gauge;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::cache::ResponseCache;

const METRIC_CACHE_ENTRIES: &str = "feedfront_cache_entries";

/// Drop expired snapshots and publish the resulting cache size.
pub fn sweep_once(cache: &ResponseCache) -> usize {
    let purged = cache.purge_expired();
    let remaining = cache.len();
    gauge!(METRIC_CACHE_ENTRIES).set(remaining as f64);
    if purged > 0 {
        debug!(
            target = "feedfront::cache_sweeper",
            purged, remaining, "swept expired snapshots"
        );
    }
    purged
}

/// Sweep on a fixed cadence until the returned handle is aborted.
pub fn spawn(cache: Arc<ResponseCache>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.tick().await; // Skip the first immediate tick
        loop {
            interval.tick().await;
            sweep_once(&cache);
        }
    })
}
