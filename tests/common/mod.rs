// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Request, Response};
use rsa_sentinel::config::Config;
use rsa_sentinel::db::MemoryStore;
use rsa_sentinel::routes::create_router;
use rsa_sentinel::services::alert::{LogNotificationSink, NotificationPermission};
use rsa_sentinel::services::safety::ScriptedScoreEstimator;
use rsa_sentinel::AppState;
use serde_json::{json, Value};
use std::sync::Arc;

/// Create a test app backed by an in-memory store.
/// Scores are replayed from `scores`; Gemini calls go to `gemini_base_url`.
#[allow(dead_code)]
pub fn create_test_app_with(
    gemini_base_url: &str,
    scores: Vec<u8>,
) -> (axum::Router, Arc<AppState>, MemoryStore) {
    let config = Config {
        gemini_base_url: gemini_base_url.to_string(),
        asset_retry_base_ms: 10,
        ..Config::test_default()
    };
    let store = MemoryStore::new();
    let state = Arc::new(AppState::build(
        config,
        Arc::new(store.clone()),
        Arc::new(ScriptedScoreEstimator::new(scores)),
        Arc::new(LogNotificationSink::new(NotificationPermission::Denied)),
    ));
    (create_router(state.clone()), state, store)
}

/// Create a test app whose Gemini endpoint is unreachable.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let (app, state, _) = create_test_app_with(&Config::test_default().gemini_base_url, vec![]);
    (app, state)
}

#[allow(dead_code)]
pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[allow(dead_code)]
pub fn send_json(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[allow(dead_code)]
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// ─── Gemini response fixtures ────────────────────────────────

/// Maps-grounded response listing `titles`.
#[allow(dead_code)]
pub fn grounding_response(titles: &[&str]) -> Value {
    let chunks: Vec<Value> = titles
        .iter()
        .enumerate()
        .map(|(i, t)| json!({ "maps": { "title": t, "uri": format!("https://maps.example/{i}") } }))
        .collect();
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": "Nearby assets" }] },
            "groundingMetadata": { "groundingChunks": chunks }
        }]
    })
}

#[allow(dead_code)]
pub fn text_response(text: &str) -> Value {
    json!({
        "candidates": [{ "content": { "role": "model", "parts": [{ "text": text }] } }]
    })
}

#[allow(dead_code)]
pub fn audio_response(data: &str) -> Value {
    json!({
        "candidates": [{
            "content": {
                "role": "model",
                "parts": [{ "inlineData": { "mimeType": "audio/pcm", "data": data } }]
            }
        }]
    })
}
