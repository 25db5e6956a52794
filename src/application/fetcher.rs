//! Contract of the upstream feed source.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{FeedSnapshot, ResourceId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("upstream responded with status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("upstream request failed: {0}")]
    Transport(String),
    #[error("upstream payload could not be decoded: {0}")]
    Decode(String),
}

impl FetchError {
    /// HTTP status reported by the upstream, when there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            FetchError::Transport(_) | FetchError::Decode(_) => None,
        }
    }
}

/// Returns the complete, ordered content of a feed.
///
/// Implementations are expected to be slow and rate limited; callers go
/// through the response cache rather than invoking this per request.
#[async_trait]
pub trait ResourceFetcher: Send + Sync {
    async fn fetch(&self, resource: &ResourceId) -> Result<FeedSnapshot, FetchError>;
}
