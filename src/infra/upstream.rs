//! HTTP adapter for the upstream feed source.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use metrics::histogram;
use reqwest::Client;
use reqwest::header::ACCEPT;
use tracing::{info, instrument, warn};
use url::Url;

use crate::application::fetcher::{FetchError, ResourceFetcher};
use crate::domain::{FeedSnapshot, ResourceId};

use super::error::InfraError;

const METRIC_UPSTREAM_FETCH_MS: &str = "feedfront_upstream_fetch_ms";

/// Fetches `GET {base_url}/{resource_id}` and decodes a JSON feed snapshot.
pub struct HttpFeedFetcher {
    client: Client,
    base_url: Url,
}

impl HttpFeedFetcher {
    pub fn new(base_url: Url, timeout: Duration, user_agent: &str) -> Result<Self, InfraError> {
        if base_url.cannot_be_a_base() {
            return Err(InfraError::configuration(format!(
                "upstream base url `{base_url}` cannot carry a path"
            )));
        }

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|err| {
                InfraError::configuration(format!("failed to build upstream client: {err}"))
            })?;

        Ok(Self { client, base_url })
    }

    fn resource_url(&self, resource: &ResourceId) -> Result<Url, FetchError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                FetchError::Transport(format!(
                    "upstream base url `{}` cannot carry a path",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .push(resource.as_str());
        Ok(url)
    }
}

#[async_trait]
impl ResourceFetcher for HttpFeedFetcher {
    #[instrument(skip(self), fields(resource = %resource))]
    async fn fetch(&self, resource: &ResourceId) -> Result<FeedSnapshot, FetchError> {
        let url = self.resource_url(resource)?;
        let started_at = Instant::now();

        let response = self
            .client
            .get(url.clone())
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|err| FetchError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(
                target = "feedfront::upstream",
                status = status.as_u16(),
                url = %url,
                "Upstream returned an error status"
            );
            return Err(FetchError::Status {
                status: status.as_u16(),
                message: format!(
                    "`{url}` answered {}",
                    status.canonical_reason().unwrap_or("with an error")
                ),
            });
        }

        let snapshot = response
            .json::<FeedSnapshot>()
            .await
            .map_err(|err| FetchError::Decode(err.to_string()))?;

        let elapsed = started_at.elapsed();
        histogram!(METRIC_UPSTREAM_FETCH_MS).record(elapsed.as_secs_f64() * 1000.0);
        info!(
            target = "feedfront::upstream",
            items = snapshot.total_items(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Fetched upstream feed"
        );

        Ok(snapshot)
    }
}
