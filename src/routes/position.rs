// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Position intake and safety state.

use crate::error::{AppError, Result};
use crate::models::{Coordinate, SafetyLocation, SafetyTier};
use crate::services::PositionError;
use crate::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/position", post(push_position))
        .route("/api/position/error", post(push_position_error))
        .route("/api/safety", get(get_safety))
        .route("/api/zones", get(get_zones))
}

// ─── Intake ──────────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PushResponse {
    /// False when no watch is active and the event was dropped
    pub delivered: bool,
}

/// Push a position sample from the host's location provider.
async fn push_position(
    State(state): State<Arc<AppState>>,
    Json(coords): Json<Coordinate>,
) -> Result<(StatusCode, Json<PushResponse>)> {
    if !coords.is_valid() {
        return Err(AppError::BadRequest(format!(
            "coordinates out of range: {}, {}",
            coords.lat, coords.lng
        )));
    }

    let delivered = state.positions.publish(coords);
    if !delivered {
        tracing::debug!("Position received with no active watch");
    }
    Ok((StatusCode::ACCEPTED, Json(PushResponse { delivered })))
}

#[derive(Deserialize)]
struct PositionErrorRequest {
    kind: PositionError,
}

/// Report a failure from the host's location provider.
async fn push_position_error(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PositionErrorRequest>,
) -> Json<PushResponse> {
    tracing::warn!(error = %req.kind, "Location provider reported failure");
    Json(PushResponse {
        delivered: state.positions.report_error(req.kind),
    })
}

// ─── State ───────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SafetyResponse {
    pub score: u8,
    pub tier: SafetyTier,
    pub last_position: Option<Coordinate>,
    /// Epoch ms of the last accepted sample, 0 before the first
    pub last_update: i64,
    pub alert_visible: bool,
    pub emergency_active: bool,
    pub tracking: bool,
}

async fn get_safety(State(state): State<Arc<AppState>>) -> Json<SafetyResponse> {
    let snapshot = state.session.snapshot().await;
    Json(SafetyResponse {
        score: snapshot.safety.current_score,
        tier: snapshot.safety.current_tier,
        last_position: snapshot.safety.last_accepted_position,
        last_update: snapshot.safety.last_accepted_timestamp,
        alert_visible: state.session.alert_visible(),
        emergency_active: snapshot.emergency_active,
        tracking: state.positions.is_watching(),
    })
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ZonesResponse {
    /// Asset positions are display placements near the user
    pub assets: Vec<SafetyLocation>,
    pub hazards: Vec<SafetyLocation>,
}

async fn get_zones(State(state): State<Arc<AppState>>) -> Json<ZonesResponse> {
    let snapshot = state.session.snapshot().await;
    Json(ZonesResponse {
        assets: snapshot.assets,
        hazards: snapshot.hazards,
    })
}
