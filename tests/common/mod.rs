#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use feedfront::application::feed::FeedService;
use feedfront::application::fetcher::{FetchError, ResourceFetcher};
use feedfront::application::invalidation::InvalidationService;
use feedfront::application::pagination::PageLimits;
use feedfront::application::webhook::WebhookVerifier;
use feedfront::cache::{CacheConfig, GenerationStore, ResponseCache};
use feedfront::domain::{FeedItem, FeedSnapshot, ResourceId};
use feedfront::infra::http::{HttpState, build_router};
use http_body_util::BodyExt;
use tower::ServiceExt;

/// In-memory feed source whose content tests rewrite between requests.
#[derive(Default)]
pub struct ScriptedFetcher {
    feeds: Mutex<HashMap<String, Result<FeedSnapshot, FetchError>>>,
    calls: AtomicUsize,
}

impl ScriptedFetcher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set(&self, resource: &str, snapshot: FeedSnapshot) {
        self.feeds
            .lock()
            .unwrap()
            .insert(resource.to_string(), Ok(snapshot));
    }

    pub fn fail(&self, resource: &str, error: FetchError) {
        self.feeds
            .lock()
            .unwrap()
            .insert(resource.to_string(), Err(error));
    }

    /// Prepend a newly published item, as feed sources list newest first.
    pub fn publish(&self, resource: &str, item: FeedItem) {
        let mut feeds = self.feeds.lock().unwrap();
        if let Some(Ok(snapshot)) = feeds.get_mut(resource) {
            snapshot.items.insert(0, item);
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ResourceFetcher for ScriptedFetcher {
    async fn fetch(&self, resource: &ResourceId) -> Result<FeedSnapshot, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.feeds
            .lock()
            .unwrap()
            .get(resource.as_str())
            .cloned()
            .unwrap_or_else(|| {
                Err(FetchError::Status {
                    status: 404,
                    message: format!("no feed named `{resource}`"),
                })
            })
    }
}

/// `count` items ordered `episode-1` .. `episode-{count}`.
pub fn snapshot(title: &str, count: usize) -> FeedSnapshot {
    FeedSnapshot {
        title: title.to_string(),
        description: Some(format!("{title} description")),
        items: (1..=count).map(episode).collect(),
    }
}

pub fn episode(n: usize) -> FeedItem {
    FeedItem::new(format!("episode-{n}"))
        .with_slug(format!("ep-{n}"))
        .with_field("title", format!("Episode {n}"))
}

pub struct TestApp {
    pub router: Router,
    pub feeds: Arc<FeedService>,
}

impl TestApp {
    pub fn new(fetcher: Arc<ScriptedFetcher>) -> Self {
        Self::with(fetcher, CacheConfig::default(), None)
    }

    pub fn with(fetcher: Arc<ScriptedFetcher>, config: CacheConfig, secret: Option<&str>) -> Self {
        let cache = Arc::new(ResponseCache::new(&config));
        let feeds = Arc::new(FeedService::new(
            fetcher,
            Arc::new(GenerationStore::new()),
            cache,
            config,
        ));
        let invalidation = Arc::new(InvalidationService::new(
            Arc::clone(&feeds),
            WebhookVerifier::new(secret),
        ));
        let router = build_router(HttpState {
            feeds: Arc::clone(&feeds),
            invalidation,
            pagination: PageLimits::default(),
        });
        Self { router, feeds }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router should respond")
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        let request = Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(Body::empty())
            .expect("request should build");
        self.send(request).await
    }

    pub async fn post(&self, uri: &str, body: &str) -> Response<Body> {
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request should build");
        self.send(request).await
    }
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .expect("body should collect")
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = body_bytes(response).await;
    serde_json::from_slice(&bytes).expect("body should be json")
}

pub fn item_ids(page: &serde_json::Value) -> Vec<String> {
    page["items"]
        .as_array()
        .expect("items array")
        .iter()
        .map(|item| item["id"].as_str().expect("item id").to_string())
        .collect()
}
