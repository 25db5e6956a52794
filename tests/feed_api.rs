mod common;

use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use feedfront::application::fetcher::FetchError;
use feedfront::cache::{CacheConfig, base_key};
use feedfront::domain::ResourceId;
use serde_json::Value;

use common::{ScriptedFetcher, TestApp, body_bytes, body_json, episode, item_ids, snapshot};

fn cold_warm_config() -> CacheConfig {
    CacheConfig {
        warm_on_invalidate: false,
        ..CacheConfig::default()
    }
}

#[tokio::test]
async fn health_is_no_content() {
    let app = TestApp::new(ScriptedFetcher::new());
    let response = app.get("/_health").await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn cached_feed_ignores_upstream_until_invalidated() {
    let fetcher = ScriptedFetcher::new();
    fetcher.set("x", snapshot("Show X", 5));
    let app = TestApp::new(fetcher.clone());

    let first = body_json(app.get("/x?limit=5").await).await;
    assert_eq!(
        item_ids(&first),
        vec!["episode-1", "episode-2", "episode-3", "episode-4", "episode-5"]
    );
    assert_eq!(first["generation"], 0);

    fetcher.publish("x", episode(6));

    let same_limit = body_json(app.get("/x?limit=5").await).await;
    assert_eq!(item_ids(&same_limit).first().map(String::as_str), Some("episode-1"));
    assert_eq!(item_ids(&same_limit).last().map(String::as_str), Some("episode-5"));

    // Changing the limit does not change the key: still the cached 5.
    let wider = body_json(app.get("/x?limit=6").await).await;
    assert_eq!(wider["total_items"], 5);
    assert_eq!(item_ids(&wider).len(), 5);
    assert_eq!(fetcher.calls(), 1);

    let cleared = app.post("/x", "").await;
    assert_eq!(cleared.status(), StatusCode::OK);
    let cleared = body_json(cleared).await;
    assert_eq!(cleared["cache_cleared"], true);
    assert_eq!(cleared["generation"], 1);

    let fresh = body_json(app.get("/x?limit=6").await).await;
    let ids = item_ids(&fresh);
    assert_eq!(ids.len(), 6);
    assert_eq!(ids[0], "episode-6");
    assert_eq!(fresh["generation"], 1);
}

#[tokio::test]
async fn webhook_for_other_resource_leaves_cache_alone() {
    let fetcher = ScriptedFetcher::new();
    fetcher.set("x", snapshot("Show X", 5));
    fetcher.set("y", snapshot("Show Y", 2));
    let app = TestApp::with(fetcher.clone(), cold_warm_config(), None);

    app.get("/x").await;
    fetcher.publish("x", episode(6));

    let response = app
        .post("/", r#"{"asset":{"path":"y/artwork/cover.jpg"}}"#)
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(response).await.is_empty());

    let x = body_json(app.get("/x").await).await;
    assert_eq!(x["total_items"], 5);
    assert_eq!(x["generation"], 0);

    let y = body_json(app.get("/y").await).await;
    assert_eq!(y["generation"], 1);
}

#[tokio::test]
async fn webhook_for_resource_exposes_new_content() {
    let fetcher = ScriptedFetcher::new();
    fetcher.set("x", snapshot("Show X", 2));
    let app = TestApp::with(fetcher.clone(), cold_warm_config(), None);

    app.get("/x").await;
    fetcher.publish("x", episode(3));

    let response = app.post("/", r#"{"asset":{"path":"x/episode-3.mp3"}}"#).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let page = body_json(app.get("/x").await).await;
    assert_eq!(item_ids(&page)[0], "episode-3");
}

#[tokio::test]
async fn webhook_warms_new_generation_in_background() {
    let fetcher = ScriptedFetcher::new();
    fetcher.set("x", snapshot("Show X", 2));
    let app = TestApp::new(fetcher.clone());

    let response = app.post("/", r#"{"asset":{"path":"x/episode-3.mp3"}}"#).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let resource = ResourceId::parse("x").expect("valid id");
    let key = base_key(app.feeds.generations(), &resource);
    assert_eq!(key.generation().get(), 1);

    for _ in 0..50 {
        if app.feeds.cache().get(&key).is_some() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(app.feeds.cache().get(&key).is_some());
    assert_eq!(fetcher.calls(), 1);

    let page = body_json(app.get("/x").await).await;
    assert_eq!(page["generation"], 1);
    assert_eq!(fetcher.calls(), 1);
}

#[tokio::test]
async fn malformed_webhook_is_rejected_without_bump() {
    let fetcher = ScriptedFetcher::new();
    fetcher.set("x", snapshot("Show X", 5));
    let app = TestApp::new(fetcher.clone());

    app.get("/x").await;
    fetcher.publish("x", episode(6));

    for body in ["{}", r#"{"asset":{"url":"x/feed"}}"#, "not json", ""] {
        let response = app.post("/", body).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {body}");
        let error = body_json(response).await;
        assert_eq!(error["error"]["code"], "invalid_webhook");
    }

    let page = body_json(app.get("/x").await).await;
    assert_eq!(page["total_items"], 5);
    assert_eq!(page["generation"], 0);
    assert_eq!(fetcher.calls(), 1);
}

#[tokio::test]
async fn webhook_secret_is_enforced() {
    let fetcher = ScriptedFetcher::new();
    fetcher.set("x", snapshot("Show X", 1));
    let app = TestApp::with(fetcher, cold_warm_config(), Some("hook-secret"));
    let payload = r#"{"asset":{"path":"x/cover.png"}}"#;

    let missing = app.post("/", payload).await;
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .method(Method::POST)
        .uri("/")
        .header("x-webhook-token", "hook-secret")
        .body(Body::from(payload))
        .expect("request should build");
    let accepted = app.send(request).await;
    assert_eq!(accepted.status(), StatusCode::NO_CONTENT);

    let resource = ResourceId::parse("x").expect("valid id");
    assert_eq!(app.feeds.generations().current(&resource).get(), 1);
}

#[tokio::test]
async fn invalid_pagination_is_a_client_error() {
    let fetcher = ScriptedFetcher::new();
    fetcher.set("x", snapshot("Show X", 3));
    let app = TestApp::new(fetcher.clone());

    for uri in [
        "/x?page=0",
        "/x?page=abc",
        "/x?limit=",
        "/x?limit=-1",
        "/x?limit=1000",
        "/x?page=1&page=2",
    ] {
        let response = app.get(uri).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "uri: {uri}");
        let error = body_json(response).await;
        assert_eq!(error["error"]["code"], "invalid_query");
    }
    assert_eq!(fetcher.calls(), 0);
}

#[tokio::test]
async fn invalid_resource_id_is_a_client_error() {
    let app = TestApp::new(ScriptedFetcher::new());
    let response = app.get("/.hidden").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error = body_json(response).await;
    assert_eq!(error["error"]["code"], "invalid_resource");
}

#[tokio::test]
async fn pages_tile_the_cached_feed() {
    let fetcher = ScriptedFetcher::new();
    fetcher.set("x", snapshot("Show X", 5));
    let app = TestApp::new(fetcher.clone());

    let second = body_json(app.get("/x?page=2&limit=2").await).await;
    assert_eq!(item_ids(&second), vec!["episode-3", "episode-4"]);
    assert_eq!(second["page"], 2);
    assert_eq!(second["limit"], 2);
    assert_eq!(second["total_items"], 5);
    assert_eq!(second["total_pages"], 3);
    assert_eq!(second["title"], "Show X");

    let beyond = body_json(app.get("/x?page=9&limit=2").await).await;
    assert!(item_ids(&beyond).is_empty());
    assert_eq!(fetcher.calls(), 1);
}

#[tokio::test]
async fn repeated_reads_are_identical_apart_from_served_at() {
    let fetcher = ScriptedFetcher::new();
    fetcher.set("x", snapshot("Show X", 4));
    let app = TestApp::new(fetcher);

    let first = body_bytes(app.get("/x?page=1&limit=3").await).await;
    tokio::time::sleep(Duration::from_millis(5)).await;
    let second = body_bytes(app.get("/x?page=1&limit=3").await).await;

    let strip = |bytes: &[u8]| {
        let text = std::str::from_utf8(bytes).expect("utf-8 body").to_string();
        let start = text.find(r#","served_at":"#).expect("served_at present");
        text[..start].to_string()
    };
    assert_eq!(strip(&first), strip(&second));

    let parsed: Value = serde_json::from_slice(&first).expect("json body");
    assert!(parsed["served_at"].as_str().is_some());
}

#[tokio::test]
async fn item_lookup_by_id_and_slug() {
    let fetcher = ScriptedFetcher::new();
    fetcher.set("x", snapshot("Show X", 3));
    let app = TestApp::new(fetcher.clone());

    let by_id = body_json(app.get("/x/episode-2").await).await;
    assert_eq!(by_id["title"], "Episode 2");

    let by_slug = body_json(app.get("/x/ep-2").await).await;
    assert_eq!(by_slug, by_id);

    let missing = app.get("/x/episode-9").await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    let error = body_json(missing).await;
    assert_eq!(error["error"]["code"], "not_found");
    assert_eq!(fetcher.calls(), 1);
}

#[tokio::test]
async fn upstream_status_is_forwarded_and_not_cached() {
    let fetcher = ScriptedFetcher::new();
    fetcher.fail(
        "x",
        FetchError::Status {
            status: 503,
            message: "rate limited".to_string(),
        },
    );
    let app = TestApp::new(fetcher.clone());

    let failed = app.get("/x").await;
    assert_eq!(failed.status(), StatusCode::SERVICE_UNAVAILABLE);
    let error = body_json(failed).await;
    assert_eq!(error["error"]["code"], "upstream_error");

    let unknown = app.get("/nope").await;
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);

    fetcher.set("x", snapshot("Show X", 2));
    let recovered = app.get("/x").await;
    assert_eq!(recovered.status(), StatusCode::OK);
    assert_eq!(fetcher.calls(), 3);
}

#[tokio::test]
async fn transport_failure_is_bad_gateway() {
    let fetcher = ScriptedFetcher::new();
    fetcher.fail("x", FetchError::Transport("connection reset".to_string()));
    let app = TestApp::new(fetcher);

    let response = app.get("/x").await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn direct_invalidation_warms_the_new_generation() {
    let fetcher = ScriptedFetcher::new();
    fetcher.set("x", snapshot("Show X", 2));
    let app = TestApp::new(fetcher.clone());

    app.get("/x").await;
    fetcher.publish("x", episode(3));

    let cleared = app.post("/x", "").await;
    assert_eq!(cleared.status(), StatusCode::OK);
    assert_eq!(fetcher.calls(), 2);

    let page = body_json(app.get("/x").await).await;
    assert_eq!(page["total_items"], 3);
    assert_eq!(fetcher.calls(), 2);
}

#[tokio::test]
async fn direct_invalidation_succeeds_when_warm_fails() {
    let fetcher = ScriptedFetcher::new();
    fetcher.set("x", snapshot("Show X", 2));
    let app = TestApp::new(fetcher.clone());

    app.get("/x").await;
    fetcher.fail("x", FetchError::Transport("down".to_string()));

    let cleared = app.post("/x", "").await;
    assert_eq!(cleared.status(), StatusCode::OK);
    assert_eq!(body_json(cleared).await["generation"], 1);
}
