// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! RSA Sentinel API Server
//!
//! Runs the monitoring session against positions pushed by the UI shell
//! and serves the resulting safety state over HTTP.

use rsa_sentinel::{
    config::Config,
    db::FileStore,
    services::{LogNotificationSink, RandomScoreEstimator},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured JSON logging
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting RSA Sentinel API");

    // Durable key-value store
    let store = FileStore::open(&config.data_dir)?;
    tracing::info!(path = %config.data_dir.display(), "Data store opened");

    let notifications = Arc::new(LogNotificationSink::new(config.notification_permission));
    let state = Arc::new(AppState::build(
        config.clone(),
        Arc::new(store),
        Arc::new(RandomScoreEstimator::default()),
        notifications,
    ));

    // Monitoring session follows positions pushed through the API
    {
        let state = state.clone();
        tokio::spawn(async move { state.run_session().await });
    }

    // Build router
    let app = rsa_sentinel::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() -> anyhow::Result<()> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("rsa_sentinel=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
