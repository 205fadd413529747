// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Assistant routes: briefing, scene analysis, speech.

use crate::error::{AppError, Result};
use crate::models::Coordinate;
use crate::services::gemini::strip_data_url;
use crate::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/briefing", get(get_briefing))
        .route("/api/assistant/analyze", post(analyze))
        .route("/api/assistant/speak", post(speak))
}

// ─── Briefing ────────────────────────────────────────────────

#[derive(Deserialize)]
struct BriefingQuery {
    lat: Option<f64>,
    lng: Option<f64>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct BriefingResponse {
    pub briefing: String,
}

/// Briefing for the given coordinates, or the last accepted position.
async fn get_briefing(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BriefingQuery>,
) -> Result<Json<BriefingResponse>> {
    let position = match (query.lat, query.lng) {
        (Some(lat), Some(lng)) => {
            let coords = Coordinate::new(lat, lng);
            if !coords.is_valid() {
                return Err(AppError::BadRequest(format!(
                    "coordinates out of range: {lat}, {lng}"
                )));
            }
            coords
        }
        (None, None) => state
            .session
            .last_position()
            .await
            .ok_or_else(|| AppError::NotFound("no position fix yet".to_string()))?,
        _ => {
            return Err(AppError::BadRequest(
                "lat and lng must be given together".to_string(),
            ))
        }
    };

    Ok(Json(BriefingResponse {
        briefing: state.assistant.briefing(position).await,
    }))
}

// ─── Scene Analysis ──────────────────────────────────────────

#[derive(Deserialize)]
struct AnalyzeRequest {
    #[serde(default)]
    prompt: String,
    /// Base64 JPEG or data URL
    image: Option<String>,
    /// Base64 WebM or data URL
    audio: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AnalyzeResponse {
    pub analysis: String,
    /// Library entry created for an analyzed image
    pub evidence_id: Option<String>,
}

fn check_base64(field: &str, value: Option<&str>) -> Result<()> {
    if let Some(data) = value {
        STANDARD
            .decode(strip_data_url(data))
            .map_err(|e| AppError::BadRequest(format!("{field} is not valid base64: {e}")))?;
    }
    Ok(())
}

/// Analyze text, image and audio; analyzed images go to the library.
async fn analyze(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>> {
    if req.prompt.trim().is_empty() && req.image.is_none() && req.audio.is_none() {
        return Err(AppError::BadRequest(
            "prompt, image or audio required".to_string(),
        ));
    }
    check_base64("image", req.image.as_deref())?;
    check_base64("audio", req.audio.as_deref())?;

    let analysis = state
        .assistant
        .analyze(&req.prompt, req.image.as_deref(), req.audio.as_deref())
        .await;

    let evidence_id = match req.image {
        Some(url) => Some(state.records.add_evidence(url, Some(analysis.clone()))?.id),
        None => None,
    };

    Ok(Json(AnalyzeResponse {
        analysis,
        evidence_id,
    }))
}

// ─── Speech ──────────────────────────────────────────────────

#[derive(Deserialize)]
struct SpeakRequest {
    text: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SpeakResponse {
    /// Base64 PCM audio
    pub audio: String,
}

/// Speak an acknowledgement; 204 when no audio was produced.
async fn speak(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SpeakRequest>,
) -> Result<Response> {
    if req.text.trim().is_empty() {
        return Err(AppError::BadRequest("text required".to_string()));
    }

    Ok(match state.assistant.speak(&req.text).await {
        Some(audio) => Json(SpeakResponse { audio }).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    })
}
