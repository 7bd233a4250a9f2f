//! Query expansion against a mocked chat-completion API.

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use chrono::{Duration, Utc};
use eventscout::clients::llm::ChatClient;
use eventscout::config::{Config, ExpansionConfig};
use eventscout::db::Store;
use eventscout::models::{EventStatus, NewEvent};
use eventscout::services::{LlmQueryExpander, QueryExpander};
use eventscout::state::SharedState;
use http_body_util::BodyExt;
use sea_orm::TransactionTrait;
use std::sync::Arc;
use tower::ServiceExt;

fn temp_db_url() -> String {
    let db_path = std::env::temp_dir().join(format!(
        "eventscout-expansion-test-{}.db",
        uuid::Uuid::new_v4()
    ));
    format!("sqlite:{}", db_path.display())
}

async fn temp_store() -> Store {
    Store::with_pool_options(&temp_db_url(), 1, 1)
        .await
        .expect("Failed to open store")
}

fn expansion_config(base_url: &str) -> ExpansionConfig {
    ExpansionConfig {
        base_url: base_url.to_string(),
        api_key: Some("sk-test".to_string()),
        model: "test-model".to_string(),
        timeout_ms: 1500,
        ..ExpansionConfig::default()
    }
}

fn expander(config: &ExpansionConfig, store: Option<Store>) -> LlmQueryExpander {
    let chat = ChatClient::with_shared_client(
        reqwest::Client::new(),
        &config.base_url,
        config.api_key.clone().unwrap_or_default(),
        config.model.clone(),
        config.temperature,
    );
    LlmQueryExpander::new(chat, config, store)
}

/// Cache writes are spawned, so wait until the entry lands.
async fn wait_for_cache_entry(store: &Store, key: &str) {
    for _ in 0..100 {
        if store
            .get_cached_expansion(key, Utc::now())
            .await
            .unwrap()
            .is_some()
        {
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    panic!("cache entry for {key:?} never written");
}

fn completion(content: &str) -> String {
    serde_json::json!({
        "choices": [{ "message": { "role": "assistant", "content": content } }]
    })
    .to_string()
}

#[tokio::test]
async fn test_expands_with_original_first() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(completion(r#"{"terms": ["coffee", "cà phê", "커피", "Coffee"]}"#))
        .create_async()
        .await;

    let set = expander(&expansion_config(&server.url()), None)
        .expand("coffe")
        .await;

    assert_eq!(set.terms(), ["coffe", "coffee", "cà phê", "커피"]);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_server_error_falls_back_to_original() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/chat/completions")
        .with_status(500)
        .with_body("upstream exploded")
        .create_async()
        .await;

    let set = expander(&expansion_config(&server.url()), None)
        .expand(" night market ")
        .await;

    assert_eq!(set.terms(), ["night market"]);
    assert!(!set.is_expanded());
}

#[tokio::test]
async fn test_non_json_content_falls_back_to_original() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(completion("Sure! Try: coffee, cà phê"))
        .create_async()
        .await;

    let set = expander(&expansion_config(&server.url()), None)
        .expand("coffe")
        .await;

    assert_eq!(set.terms(), ["coffe"]);
}

#[tokio::test]
async fn test_slow_model_times_out() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let held = tokio::spawn(async move {
        let mut sockets = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            sockets.push(socket);
        }
    });

    let config = ExpansionConfig {
        timeout_ms: 150,
        ..expansion_config(&format!("http://{addr}"))
    };

    let started = std::time::Instant::now();
    let set = expander(&config, None).expand("coffe").await;

    assert_eq!(set.terms(), ["coffe"]);
    assert!(started.elapsed() < std::time::Duration::from_secs(5));
    held.abort();
}

#[tokio::test]
async fn test_successful_expansion_is_cached() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(completion(r#"{"terms": ["yoga class", "요가"]}"#))
        .expect(1)
        .create_async()
        .await;

    let store = temp_store().await;
    let expander = expander(&expansion_config(&server.url()), Some(store.clone()));

    let first = expander.expand("Yoga").await;
    wait_for_cache_entry(&store, "yoga").await;
    let second = expander.expand("yoga").await;

    assert_eq!(first.terms(), ["Yoga", "yoga class", "요가"]);
    assert_eq!(second.terms(), ["yoga", "yoga class", "요가"]);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_locked_cache_does_not_hold_up_expansion() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(completion(r#"{"terms": ["coffee"]}"#))
        .create_async()
        .await;

    // The pool has a single connection; holding it in a transaction makes
    // every cache read wait for the pool's acquire timeout.
    let store = temp_store().await;
    let txn = store.conn.begin().await.unwrap();

    let config = ExpansionConfig {
        timeout_ms: 400,
        ..expansion_config(&server.url())
    };

    let started = std::time::Instant::now();
    let set = expander(&config, Some(store.clone())).expand("coffe").await;

    assert!(started.elapsed() < std::time::Duration::from_millis(1500));
    assert_eq!(set.terms(), ["coffe", "coffee"]);
    mock.assert_async().await;

    drop(txn);
}

#[tokio::test]
async fn test_locked_cache_and_silent_model_fall_back_within_timeout() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let held = tokio::spawn(async move {
        let mut sockets = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            sockets.push(socket);
        }
    });

    let store = temp_store().await;
    let txn = store.conn.begin().await.unwrap();

    let config = ExpansionConfig {
        timeout_ms: 300,
        ..expansion_config(&format!("http://{addr}"))
    };

    let started = std::time::Instant::now();
    let set = expander(&config, Some(store.clone())).expand("coffe").await;

    assert_eq!(set.terms(), ["coffe"]);
    assert!(started.elapsed() < std::time::Duration::from_millis(1500));

    drop(txn);
    held.abort();
}

#[tokio::test]
async fn test_fallbacks_are_not_cached() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .with_status(503)
        .expect(2)
        .create_async()
        .await;

    let store = temp_store().await;
    let expander = expander(&expansion_config(&server.url()), Some(store));

    expander.expand("jazz").await;
    expander.expand("jazz").await;

    mock.assert_async().await;
}

#[tokio::test]
async fn test_expanded_suggestions_end_to_end() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/chat/completions")
        .match_header("authorization", "Bearer sk-test")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(completion(r#"{"terms": ["coffee", "cà phê"]}"#))
        .create_async()
        .await;

    let mut config = Config::default();
    config.general.database_path = temp_db_url();
    config.expansion = expansion_config(&server.url());
    config.observability.metrics_enabled = false;

    let store = Store::with_pool_options(&config.general.database_path, 1, 1)
        .await
        .unwrap();

    for (slug, title, days) in [
        ("coffee-cupping", "Coffee Cupping", 2),
        ("ca-phe-workshop", "Cà phê Workshop", 1),
        ("tea-ceremony", "Tea Ceremony", 3),
    ] {
        store
            .upsert_event(&NewEvent {
                slug: slug.to_string(),
                title: title.to_string(),
                description: None,
                location_name: None,
                image_url: None,
                starts_at: Utc::now() + Duration::days(days),
                ends_at: None,
                status: EventStatus::Published,
            })
            .await
            .unwrap();
    }

    let shared = Arc::new(SharedState::with_store(config, store).unwrap());
    let state = eventscout::api::create_app_state(shared, None);
    let app = eventscout::api::router(state).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/search/suggestions?q=coffe")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(
        json["expandedTerms"],
        serde_json::json!(["coffe", "coffee", "cà phê"])
    );
    let slugs: Vec<&str> = json["suggestions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["slug"].as_str().unwrap())
        .collect();
    assert_eq!(slugs, vec!["coffee-cupping", "ca-phe-workshop"]);
}
