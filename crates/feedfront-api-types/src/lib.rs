//! Wire types for the feedfront HTTP API.
//!
//! Kept in a standalone crate so that clients and the server agree on the
//! exact JSON shape (including field order) without pulling in the server.

use serde::{Deserialize, Serialize};

/// A single page of a feed as returned by `GET /{resource_id}`.
///
/// Field order is part of the contract: identical requests without an
/// intervening invalidation serialize to identical bytes apart from
/// `served_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedPageResponse<I> {
    pub title: String,
    pub description: Option<String>,
    pub items: Vec<I>,
    pub page: u32,
    pub limit: u32,
    pub total_items: usize,
    pub total_pages: usize,
    pub generation: u64,
    pub served_at: String,
}

/// Response body for a direct invalidation (`POST /{resource_id}`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheClearedResponse {
    pub cache_cleared: bool,
    pub generation: u64,
}

/// Error envelope shared by every non-success JSON response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorMessage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorMessage {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

/// Stable error codes carried in [`ApiErrorMessage::code`].
pub mod codes {
    pub const INVALID_QUERY: &str = "invalid_query";
    pub const INVALID_RESOURCE: &str = "invalid_resource";
    pub const INVALID_WEBHOOK: &str = "invalid_webhook";
    pub const UNAUTHORIZED: &str = "unauthorized";
    pub const NOT_FOUND: &str = "not_found";
    pub const UPSTREAM: &str = "upstream_error";
    pub const INTERNAL: &str = "internal_error";
}
