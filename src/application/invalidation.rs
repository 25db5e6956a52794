//! Direct and webhook-driven invalidation.
//!
//! Invalidating a resource only bumps its generation; cached snapshots
//! under older generations become unreachable and age out of the LRU.

use std::sync::Arc;

use tracing::{info, warn};

use crate::application::feed::FeedService;
use crate::application::webhook::{WebhookError, WebhookVerifier, parse_webhook};
use crate::cache::Generation;
use crate::domain::ResourceId;

pub struct InvalidationService {
    feeds: Arc<FeedService>,
    verifier: WebhookVerifier,
}

impl InvalidationService {
    pub fn new(feeds: Arc<FeedService>, verifier: WebhookVerifier) -> Self {
        Self { feeds, verifier }
    }

    /// Bump `resource` and, when warming is enabled, refetch it before
    /// returning. A failed warm is logged; the bump stands either way.
    pub async fn invalidate_direct(&self, resource: &ResourceId) -> Generation {
        let generation = self.feeds.generations().bump(resource);
        info!(resource = %resource, generation = %generation, "cache invalidated");

        if self.feeds.config().warm_on_invalidate
            && let Err(err) = self.feeds.warm(resource).await
        {
            warn!(resource = %resource, error = %err, "cache warm after invalidation failed");
        }

        generation
    }

    /// Verify and parse a webhook, then bump the resource it names.
    ///
    /// Rejected webhooks leave every generation untouched. Warming runs in
    /// the background so the sender is answered immediately.
    pub fn invalidate_from_webhook(
        &self,
        body: &[u8],
        token: Option<&str>,
    ) -> Result<(ResourceId, Generation), WebhookError> {
        self.verifier.verify(token)?;
        let resource = parse_webhook(body)?;

        let generation = self.feeds.generations().bump(&resource);
        info!(resource = %resource, generation = %generation, "cache invalidated by webhook");

        if self.feeds.config().warm_on_invalidate {
            let feeds = Arc::clone(&self.feeds);
            let target = resource.clone();
            tokio::spawn(async move {
                if let Err(err) = feeds.warm(&target).await {
                    warn!(resource = %target, error = %err, "background cache warm failed");
                }
            });
        }

        Ok((resource, generation))
    }
}
