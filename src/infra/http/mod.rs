//! HTTP surface: feed reads, direct invalidation and the webhook.

mod error;
mod handlers;
mod middleware;

use std::sync::Arc;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};

use crate::application::feed::FeedService;
use crate::application::invalidation::InvalidationService;
use crate::application::pagination::PageLimits;

pub use error::ApiError;
pub use middleware::{REQUEST_ID_HEADER, RequestContext};

#[derive(Clone)]
pub struct HttpState {
    pub feeds: Arc<FeedService>,
    pub invalidation: Arc<InvalidationService>,
    pub pagination: PageLimits,
}

pub fn build_router(state: HttpState) -> Router {
    Router::new()
        .route("/", post(handlers::webhook))
        .route("/_health", get(handlers::health))
        .route(
            "/{resource_id}",
            get(handlers::get_feed).post(handlers::invalidate),
        )
        .route("/{resource_id}/{item}", get(handlers::get_item))
        .with_state(state)
        .layer(axum_middleware::from_fn(middleware::log_responses))
        .layer(axum_middleware::from_fn(middleware::set_request_context))
}
