// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! RSA Sentinel: location-driven personal safety engine
//!
//! This crate consumes a stream of position samples, throttles them by
//! movement, scores each accepted position into a safety tier, raises
//! alerts on entry into danger, and looks up nearby emergency assets.
//! An HTTP API exposes the state to a UI shell.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use db::KeyValueStore;
use services::{
    AlertNotifier, AssetResolver, ChannelPositionSource, GeminiClient, MovementGate,
    NotificationSink, RecordService, RetryPolicy, SafetyAssistant, SafetyEngine,
    SafetyScoreEstimator, SentinelSession,
};
use std::sync::Arc;
use std::time::Duration;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub session: SentinelSession<GeminiClient>,
    /// Host-facing end of the position watch
    pub positions: ChannelPositionSource,
    pub records: RecordService,
    pub assistant: SafetyAssistant,
}

impl AppState {
    /// Wire every service from `config` and the pluggable pieces.
    pub fn build(
        config: Config,
        store: Arc<dyn KeyValueStore>,
        estimator: Arc<dyn SafetyScoreEstimator>,
        notifications: Arc<dyn NotificationSink>,
    ) -> Self {
        let gemini = GeminiClient::new(&config.gemini_base_url, &config.gemini_api_key);
        let retry = RetryPolicy {
            max_retries: config.asset_retry_max,
            base_delay: Duration::from_millis(config.asset_retry_base_ms),
            ..RetryPolicy::default()
        };

        let session = SentinelSession::new(
            MovementGate::new(
                config.movement_min_distance_m,
                config.movement_min_interval_ms,
            ),
            SafetyEngine::new(estimator),
            AssetResolver::new(gemini.clone(), retry, store.clone()),
            AlertNotifier::new(
                notifications,
                Duration::from_millis(config.alert_window_ms),
            ),
        );

        Self {
            config,
            session,
            positions: ChannelPositionSource::new(),
            records: RecordService::new(store),
            assistant: SafetyAssistant::new(gemini, retry),
        }
    }
}

impl AppState {
    /// Keep the monitoring session attached to the host feed.
    ///
    /// A provider error ends the current watch. The next sample the host
    /// posts finds nobody listening and starts a fresh watch; that sample
    /// itself is reported undelivered.
    pub async fn run_session(&self) {
        loop {
            match self.session.run(&self.positions).await {
                Some(err) => tracing::error!(error = %err, "Location tracking stopped"),
                None => tracing::info!("Location tracking stopped"),
            }
            self.positions.sample_demand().await;
            tracing::info!("Restarting location tracking");
        }
    }
}
