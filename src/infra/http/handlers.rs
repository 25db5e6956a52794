use axum::Json;
use axum::body::Bytes;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use feedfront_api_types::{CacheClearedResponse, FeedPageResponse, codes};
use serde::Deserialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::debug;

use crate::application::feed::FeedPage;
use crate::application::pagination::PageQuery;
use crate::application::webhook::WEBHOOK_TOKEN_HEADER;
use crate::domain::{FeedItem, ResourceId};

use super::HttpState;
use super::error::{ApiError, feed_to_api, resource_to_api, webhook_to_api};

/// Raw `page`/`limit` values; validation happens in [`PageQuery::from_raw`]
/// so an empty or non-numeric value is rejected rather than defaulted.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PageParams {
    pub page: Option<String>,
    pub limit: Option<String>,
}

pub async fn health() -> StatusCode {
    StatusCode::NO_CONTENT
}

pub async fn get_feed(
    State(state): State<HttpState>,
    Path(resource): Path<String>,
    params: Result<Query<PageParams>, QueryRejection>,
) -> Result<Json<FeedPageResponse<FeedItem>>, ApiError> {
    let resource = ResourceId::parse(&resource).map_err(resource_to_api)?;
    let Query(params) = params.map_err(|rejection| {
        ApiError::bad_request(
            codes::INVALID_QUERY,
            "invalid pagination parameters",
            Some(rejection.body_text()),
        )
    })?;
    let query = PageQuery::from_raw(
        params.page.as_deref(),
        params.limit.as_deref(),
        &state.pagination,
    )
    .map_err(|err| feed_to_api(err.into()))?;

    let page = state
        .feeds
        .page(&resource, query)
        .await
        .map_err(feed_to_api)?;

    Ok(Json(page_response(page, served_at()?)))
}

pub async fn get_item(
    State(state): State<HttpState>,
    Path((resource, item)): Path<(String, String)>,
) -> Result<Json<FeedItem>, ApiError> {
    let resource = ResourceId::parse(&resource).map_err(resource_to_api)?;
    let item = state
        .feeds
        .item(&resource, &item)
        .await
        .map_err(feed_to_api)?;
    Ok(Json(item))
}

pub async fn invalidate(
    State(state): State<HttpState>,
    Path(resource): Path<String>,
) -> Result<Json<CacheClearedResponse>, ApiError> {
    let resource = ResourceId::parse(&resource).map_err(resource_to_api)?;
    let generation = state.invalidation.invalidate_direct(&resource).await;
    Ok(Json(CacheClearedResponse {
        cache_cleared: true,
        generation: generation.get(),
    }))
}

pub async fn webhook(
    State(state): State<HttpState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let token = headers
        .get(WEBHOOK_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok());

    let (resource, generation) = state
        .invalidation
        .invalidate_from_webhook(&body, token)
        .map_err(webhook_to_api)?;
    debug!(resource = %resource, generation = %generation, "webhook accepted");

    Ok(StatusCode::NO_CONTENT)
}

fn page_response(page: FeedPage, served_at: String) -> FeedPageResponse<FeedItem> {
    FeedPageResponse {
        title: page.title,
        description: page.description,
        items: page.items,
        page: page.page,
        limit: page.limit,
        total_items: page.total_items,
        total_pages: page.total_pages,
        generation: page.generation.get(),
        served_at,
    }
}

fn served_at() -> Result<String, ApiError> {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .map_err(|err| ApiError::internal(err.to_string()))
}
