// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Gemini client, asset resolver and assistant against a mock API.

use rsa_sentinel::db::{self, keys, MemoryStore};
use rsa_sentinel::models::{Coordinate, LocationType, SafetyLocation};
use rsa_sentinel::services::assistant::{
    ANALYSIS_FAILED, ANALYSIS_RATE_LIMITED, BRIEFING_EMPTY, BRIEFING_FAILED,
};
use rsa_sentinel::services::gemini::{GROUNDING_MODEL, TEXT_MODEL, TTS_MODEL};
use rsa_sentinel::services::{AssetResolver, GeminiClient, GeminiError, RetryPolicy, SafetyAssistant};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;

const JOBURG: Coordinate = Coordinate::new(-26.2041, 28.0473);

fn model_path(model: &str) -> String {
    format!("/v1beta/models/{model}:generateContent")
}

fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        base_delay: Duration::from_millis(10),
        ..RetryPolicy::default()
    }
}

fn resolver(server: &MockServer, store: &MemoryStore) -> AssetResolver<GeminiClient> {
    AssetResolver::new(
        GeminiClient::new(server.uri(), "test-key"),
        fast_retry(),
        Arc::new(store.clone()),
    )
}

fn assistant(server: &MockServer) -> SafetyAssistant {
    SafetyAssistant::new(GeminiClient::new(server.uri(), "test-key"), fast_retry())
}

// ─── Client ──────────────────────────────────────────────────

#[tokio::test]
async fn test_nearby_places_request_shape() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(model_path(GROUNDING_MODEL)))
        .and(header("x-goog-api-key", "test-key"))
        .and(body_partial_json(json!({
            "tools": [{ "googleMaps": {} }],
            "toolConfig": {
                "retrievalConfig": {
                    "latLng": { "latitude": -26.2041, "longitude": 28.0473 }
                }
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::grounding_response(&[
            "Johannesburg Central Police Station",
            "Charlotte Maxeke Hospital",
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let client = GeminiClient::new(server.uri(), "test-key");
    let places = client.nearby_places(JOBURG).await.unwrap();
    assert_eq!(places.len(), 2);
    assert_eq!(
        places[0].title.as_deref(),
        Some("Johannesburg Central Police Station")
    );
}

#[tokio::test]
async fn test_429_maps_to_rate_limited() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .mount(&server)
        .await;

    let client = GeminiClient::new(server.uri(), "test-key");
    let err = client.nearby_places(JOBURG).await.unwrap_err();
    assert!(matches!(err, GeminiError::RateLimited));
}

#[tokio::test]
async fn test_missing_grounding_metadata_is_empty() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::text_response("nothing")))
        .mount(&server)
        .await;

    let client = GeminiClient::new(server.uri(), "test-key");
    assert!(client.nearby_places(JOBURG).await.unwrap().is_empty());
}

// ─── Asset Resolver ──────────────────────────────────────────

#[tokio::test]
async fn test_resolver_success_is_cached() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(model_path(GROUNDING_MODEL)))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::grounding_response(&[
            "Hillbrow Police Station",
            "Netcare Medical Centre",
            "Community Shelter",
        ])))
        .mount(&server)
        .await;

    let store = MemoryStore::new();
    let assets = resolver(&server, &store).resolve(JOBURG).await;

    let types: Vec<LocationType> = assets.iter().map(|a| a.location_type).collect();
    assert_eq!(
        types,
        vec![LocationType::Police, LocationType::Hospital, LocationType::SafeHub]
    );
    assert_eq!(assets[0].address.as_deref(), Some("https://maps.example/0"));

    let cached: Vec<SafetyLocation> = db::load_json(&store, keys::CACHED_ASSETS)
        .unwrap()
        .unwrap();
    assert_eq!(cached, assets);
}

#[tokio::test]
async fn test_resolver_retries_rate_limit() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(common::grounding_response(&["City Hospital"])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let assets = resolver(&server, &MemoryStore::new()).resolve(JOBURG).await;
    assert_eq!(assets.len(), 1);
    assert_eq!(assets[0].location_type, LocationType::Hospital);
}

#[tokio::test]
async fn test_resolver_server_error_without_cache_is_empty() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal"))
        .expect(1)
        .mount(&server)
        .await;

    let assets = resolver(&server, &MemoryStore::new()).resolve(JOBURG).await;
    assert!(assets.is_empty());
}

#[tokio::test]
async fn test_resolver_success_then_failure_returns_first() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::grounding_response(&[
            "Sandton Police",
            "Rosebank Clinic",
        ])))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let r = resolver(&server, &MemoryStore::new());
    let first = r.resolve(JOBURG).await;
    let second = r.resolve(JOBURG.offset(0.01, 0.0)).await;
    assert_eq!(first.len(), 2);
    assert_eq!(second, first);
}

// ─── Assistant ───────────────────────────────────────────────

#[tokio::test]
async fn test_briefing_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(model_path(TEXT_MODEL)))
        .and(body_partial_json(json!({
            "systemInstruction": {
                "parts": [{ "text": "You are the RSA Sentinel AI. Provide concise, professional tactical advice (max 20 words)." }]
            }
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(common::text_response("Stay on lit main roads.")),
        )
        .mount(&server)
        .await;

    assert_eq!(
        assistant(&server).briefing(JOBURG).await,
        "Stay on lit main roads."
    );
}

#[tokio::test]
async fn test_briefing_fallbacks() {
    let empty = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
        .mount(&empty)
        .await;
    assert_eq!(assistant(&empty).briefing(JOBURG).await, BRIEFING_EMPTY);

    let broken = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&broken)
        .await;
    assert_eq!(assistant(&broken).briefing(JOBURG).await, BRIEFING_FAILED);
}

#[tokio::test]
async fn test_analysis_with_image_strips_data_url() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(model_path(TEXT_MODEL)))
        .and(body_partial_json(json!({
            "contents": [{
                "parts": [
                    {},
                    { "inlineData": { "mimeType": "image/jpeg", "data": "/9j/AAAA" } }
                ]
            }]
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(common::text_response("SUB-OPTIMAL")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let analysis = assistant(&server)
        .analyze("Is this safe?", Some("data:image/jpeg;base64,/9j/AAAA"), None)
        .await;
    assert_eq!(analysis, "SUB-OPTIMAL");
}

#[tokio::test]
async fn test_analysis_fallbacks() {
    let limited = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429))
        .expect(3)
        .mount(&limited)
        .await;
    assert_eq!(
        assistant(&limited).analyze("status?", None, None).await,
        ANALYSIS_RATE_LIMITED
    );

    let broken = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad request"))
        .expect(1)
        .mount(&broken)
        .await;
    assert_eq!(
        assistant(&broken).analyze("status?", None, None).await,
        ANALYSIS_FAILED
    );
}

#[tokio::test]
async fn test_speak() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(model_path(TTS_MODEL)))
        .and(body_partial_json(json!({
            "contents": [{ "parts": [{ "text": "Acknowledge: move to the exit" }] }],
            "generationConfig": {
                "speechConfig": {
                    "voiceConfig": { "prebuiltVoiceConfig": { "voiceName": "Kore" } }
                }
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::audio_response("UklGRg==")))
        .mount(&server)
        .await;

    assert_eq!(
        assistant(&server).speak("move to the exit").await.as_deref(),
        Some("UklGRg==")
    );
}

#[tokio::test]
async fn test_speak_failure_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    assert!(assistant(&server).speak("hello").await.is_none());
}
