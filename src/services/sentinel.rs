// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session wiring: position samples in, safety state out.
//!
//! Each sample passes the movement gate, then regenerates hazards, scores
//! the position and raises an alert on entry into DANGER. Asset lookups
//! run in the background; every lookup carries a sequence number and a
//! result older than the one already applied is dropped.

use crate::models::{Coordinate, Evaluation, SafetyLocation, SafetyState};
use crate::services::alert::AlertNotifier;
use crate::services::assets::{place_assets, AssetResolver, AssetSource, DEFAULT_PLACEMENT_SPREAD_DEGREES};
use crate::services::hazard::HazardZoneGenerator;
use crate::services::movement::MovementGate;
use crate::services::position::{PositionError, PositionSource, WatchOptions};
use crate::services::safety::SafetyEngine;
use futures_util::StreamExt;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

/// Read-only view of the session for presentation.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    #[serde(flatten)]
    pub safety: SafetyState,
    pub hazards: Vec<SafetyLocation>,
    pub assets: Vec<SafetyLocation>,
    pub emergency_active: bool,
}

/// Outcome of a sample that passed the movement gate.
pub struct Accepted {
    pub evaluation: Evaluation,
    /// Background asset lookup started for this sample.
    pub assets_task: JoinHandle<()>,
}

struct SessionState {
    engine: SafetyEngine,
    snapshot: SessionSnapshot,
    applied_asset_seq: u64,
}

struct Inner<S> {
    gate: MovementGate,
    hazards: HazardZoneGenerator,
    resolver: AssetResolver<S>,
    notifier: AlertNotifier,
    placement_spread: f64,
    state: RwLock<SessionState>,
    next_asset_seq: AtomicU64,
}

/// One user's monitoring session. Cheap to clone.
pub struct SentinelSession<S> {
    inner: Arc<Inner<S>>,
}

impl<S> Clone for SentinelSession<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<S: AssetSource + 'static> SentinelSession<S> {
    pub fn new(
        gate: MovementGate,
        engine: SafetyEngine,
        resolver: AssetResolver<S>,
        notifier: AlertNotifier,
    ) -> Self {
        let snapshot = SessionSnapshot {
            safety: SafetyState {
                current_score: engine.current_score(),
                current_tier: engine.current_tier(),
                ..Default::default()
            },
            ..Default::default()
        };

        Self {
            inner: Arc::new(Inner {
                gate,
                hazards: HazardZoneGenerator,
                resolver,
                notifier,
                placement_spread: DEFAULT_PLACEMENT_SPREAD_DEGREES,
                state: RwLock::new(SessionState {
                    engine,
                    snapshot,
                    applied_asset_seq: 0,
                }),
                next_asset_seq: AtomicU64::new(0),
            }),
        }
    }

    /// Watch `source` until it fails, feeding every sample through the session.
    ///
    /// Returns the provider error that ended the watch, if any. Dropping the
    /// returned future releases the watch.
    pub async fn run(&self, source: &dyn PositionSource) -> Option<PositionError> {
        let mut watch = source.watch(WatchOptions {
            high_accuracy: true,
        });
        tracing::info!("Monitoring session started");

        while let Some(coords) = watch.next().await {
            let now_ms = chrono::Utc::now().timestamp_millis();
            self.on_position(coords, now_ms).await;
        }

        let err = watch.error();
        tracing::info!(error = ?err, "Position watch ended");
        err
    }

    /// Handle one position sample taken at `now_ms`.
    ///
    /// Returns `None` when the movement gate rejects the sample.
    pub async fn on_position(&self, coords: Coordinate, now_ms: i64) -> Option<Accepted> {
        let evaluation = {
            let mut state = self.inner.state.write().await;
            let safety = &state.snapshot.safety;
            if !self.inner.gate.accept(
                coords,
                safety.last_accepted_position,
                safety.last_accepted_timestamp,
                now_ms,
            ) {
                tracing::debug!(lat = coords.lat, lng = coords.lng, "Sample below movement threshold");
                return None;
            }

            let hazards = self.inner.hazards.generate(coords);
            state.engine.observe_hazards(&hazards);
            let evaluation = state.engine.evaluate(coords);

            let snapshot = &mut state.snapshot;
            snapshot.safety.record_accepted(coords, now_ms);
            snapshot.safety.apply(&evaluation);
            snapshot.hazards = hazards;
            evaluation
        };

        tracing::debug!(
            lat = coords.lat,
            lng = coords.lng,
            score = evaluation.score,
            tier = %evaluation.tier,
            "Position accepted"
        );

        if evaluation.alert {
            tracing::warn!(score = evaluation.score, "Entered danger tier");
            self.inner.notifier.notify();
        }

        let assets_task = self.spawn_asset_lookup(coords);
        Some(Accepted {
            evaluation,
            assets_task,
        })
    }

    fn spawn_asset_lookup(&self, coords: Coordinate) -> JoinHandle<()> {
        let seq = self.inner.next_asset_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let session = self.clone();
        tokio::spawn(async move {
            let assets = session.inner.resolver.resolve(coords).await;
            let placed = place_assets(
                &assets,
                coords,
                session.inner.placement_spread,
                &mut rand::rng(),
            );
            session.apply_assets(seq, placed).await;
        })
    }

    /// Apply the result of lookup `seq` unless a newer one was applied.
    pub async fn apply_assets(&self, seq: u64, assets: Vec<SafetyLocation>) -> bool {
        let mut state = self.inner.state.write().await;
        if seq <= state.applied_asset_seq {
            tracing::debug!(seq, applied = state.applied_asset_seq, "Dropping stale asset result");
            return false;
        }
        state.applied_asset_seq = seq;
        state.snapshot.assets = assets;
        true
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.inner.state.read().await.snapshot.clone()
    }

    pub async fn last_position(&self) -> Option<Coordinate> {
        self.inner
            .state
            .read()
            .await
            .snapshot
            .safety
            .last_accepted_position
    }

    pub fn alert_visible(&self) -> bool {
        self.inner.notifier.is_visible()
    }

    pub async fn activate_sos(&self) {
        self.inner.state.write().await.snapshot.emergency_active = true;
        tracing::warn!("SOS activated");
    }

    /// Any four-character code ends emergency mode.
    pub async fn deactivate_sos(&self, code: &str) -> bool {
        if code.chars().count() != 4 {
            tracing::info!("SOS deactivation rejected");
            return false;
        }
        self.inner.state.write().await.snapshot.emergency_active = false;
        tracing::info!("SOS deactivated");
        true
    }
}
