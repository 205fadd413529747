// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Profile, evidence library and SOS routes.

use crate::error::{AppError, Result};
use crate::models::{LibraryImage, UserProfile};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/profile", get(get_profile).put(put_profile))
        .route("/api/library", get(get_library).post(add_evidence))
        .route("/api/library/{id}", delete(delete_evidence))
        .route("/api/sos", post(activate_sos))
        .route("/api/sos/deactivate", post(deactivate_sos))
}

// ─── User Profile ────────────────────────────────────────────

async fn get_profile(State(state): State<Arc<AppState>>) -> Json<UserProfile> {
    Json(state.records.profile())
}

/// Validate and replace the profile.
async fn put_profile(
    State(state): State<Arc<AppState>>,
    Json(profile): Json<UserProfile>,
) -> Result<Json<UserProfile>> {
    state.records.save_profile(&profile)?;
    Ok(Json(profile))
}

// ─── Evidence Library ────────────────────────────────────────

async fn get_library(State(state): State<Arc<AppState>>) -> Json<Vec<LibraryImage>> {
    Json(state.records.library())
}

#[derive(Deserialize)]
struct AddEvidenceRequest {
    url: String,
    analysis: Option<String>,
}

async fn add_evidence(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AddEvidenceRequest>,
) -> Result<(StatusCode, Json<LibraryImage>)> {
    if req.url.trim().is_empty() {
        return Err(AppError::BadRequest("url required".to_string()));
    }
    let image = state.records.add_evidence(req.url, req.analysis)?;
    Ok((StatusCode::CREATED, Json(image)))
}

async fn delete_evidence(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.records.delete_evidence(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

// ─── SOS ─────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SosResponse {
    pub emergency_active: bool,
    /// Profile responders should see while the emergency is active
    pub profile: UserProfile,
}

async fn activate_sos(State(state): State<Arc<AppState>>) -> Json<SosResponse> {
    state.session.activate_sos().await;
    Json(SosResponse {
        emergency_active: true,
        profile: state.records.profile(),
    })
}

#[derive(Deserialize)]
struct DeactivateRequest {
    code: String,
}

async fn deactivate_sos(
    State(state): State<Arc<AppState>>,
    Json(req): Json<DeactivateRequest>,
) -> Result<Json<SosResponse>> {
    if !state.session.deactivate_sos(&req.code).await {
        return Err(AppError::BadRequest("invalid deactivation code".to_string()));
    }
    Ok(Json(SosResponse {
        emergency_active: false,
        profile: state.records.profile(),
    }))
}
