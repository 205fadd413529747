// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Asset resolution: nearby hospitals, police and shelters.
//!
//! Results from the remote service are normalized into [`SafetyLocation`]s.
//! Failures never reach the caller; they degrade to the last good result,
//! then to the durable cache, then to an empty list.

use crate::db::{self, keys, KeyValueStore};
use crate::models::{Coordinate, LocationType, SafetyLocation};
use crate::services::gemini::{GeminiClient, GeminiError, GroundingPlace};
use crate::services::retry::RetryPolicy;
use rand::Rng;
use std::future::Future;
use std::sync::{Arc, Mutex};

/// Maximum assets kept from one response.
pub const MAX_ASSETS: usize = 8;

/// Display spread for placed assets, in degrees on each side of the user.
pub const DEFAULT_PLACEMENT_SPREAD_DEGREES: f64 = 0.015;

const DEFAULT_TITLE: &str = "Safety Asset";
const DEFAULT_ADDRESS: &str = "Nearby Asset";
const ASSET_DESCRIPTION: &str = "Verified Emergency Response Location";

/// Remote lookup of places near a position.
pub trait AssetSource: Send + Sync {
    fn nearby_assets(
        &self,
        position: Coordinate,
    ) -> impl Future<Output = Result<Vec<GroundingPlace>, GeminiError>> + Send;
}

impl AssetSource for GeminiClient {
    fn nearby_assets(
        &self,
        position: Coordinate,
    ) -> impl Future<Output = Result<Vec<GroundingPlace>, GeminiError>> + Send {
        self.nearby_places(position)
    }
}

/// Classify an asset by keywords in its title.
pub fn classify_title(title: &str) -> LocationType {
    let lower = title.to_lowercase();
    if lower.contains("police") || lower.contains("precinct") {
        LocationType::Police
    } else if lower.contains("hospital") || lower.contains("medical") {
        LocationType::Hospital
    } else {
        LocationType::SafeHub
    }
}

/// Turn grounding places into assets with placeholder coordinates.
pub fn normalize_places<R: Rng>(
    places: Vec<GroundingPlace>,
    now_ms: i64,
    rng: &mut R,
) -> Vec<SafetyLocation> {
    places
        .into_iter()
        .take(MAX_ASSETS)
        .enumerate()
        .map(|(index, place)| {
            let title = place
                .title
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_TITLE.to_string());
            let location_type = classify_title(&title);
            let score: u8 = rng.random_range(0..100);
            SafetyLocation::asset(
                format!("safe-{index}-{now_ms}"),
                title,
                location_type,
                Coordinate::origin(),
                score,
            )
            .with_address(place.uri.unwrap_or_else(|| DEFAULT_ADDRESS.to_string()))
            .with_description(ASSET_DESCRIPTION)
        })
        .collect()
}

/// Assign display coordinates near `center`.
///
/// The service does not return geocoded positions, so assets are scattered
/// within `spread` degrees of the user for the map. These positions are not
/// real locations.
pub fn place_assets<R: Rng>(
    assets: &[SafetyLocation],
    center: Coordinate,
    spread: f64,
    rng: &mut R,
) -> Vec<SafetyLocation> {
    assets
        .iter()
        .map(|asset| {
            let mut placed = asset.clone();
            placed.coords = if spread > 0.0 {
                center.offset(
                    rng.random_range(-spread..spread),
                    rng.random_range(-spread..spread),
                )
            } else {
                center
            };
            placed
        })
        .collect()
}

/// Resolves nearby assets with retry and layered fallback.
pub struct AssetResolver<S> {
    source: S,
    policy: RetryPolicy,
    store: Arc<dyn KeyValueStore>,
    last_assets: Mutex<Vec<SafetyLocation>>,
}

impl<S: AssetSource> AssetResolver<S> {
    pub fn new(source: S, policy: RetryPolicy, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            source,
            policy,
            store,
            last_assets: Mutex::new(Vec::new()),
        }
    }

    /// Resolve assets near `position`. Never fails.
    pub async fn resolve(&self, position: Coordinate) -> Vec<SafetyLocation> {
        let result = self
            .policy
            .run(
                || self.source.nearby_assets(position),
                GeminiError::is_rate_limited,
            )
            .await;

        match result {
            Ok(places) => {
                let now_ms = chrono::Utc::now().timestamp_millis();
                let assets = normalize_places(places, now_ms, &mut rand::rng());
                if !assets.is_empty() {
                    tracing::info!(
                        count = assets.len(),
                        lat = position.lat,
                        lng = position.lng,
                        "Resolved nearby assets"
                    );
                    self.remember(&assets);
                    return assets;
                }
                tracing::info!("Asset lookup returned no places, using fallback");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Asset lookup failed, using fallback");
            }
        }

        self.fallback()
    }

    /// Most recent successful result held in memory.
    pub fn last_assets(&self) -> Vec<SafetyLocation> {
        self.last_assets
            .lock()
            .map(|g| g.clone())
            .unwrap_or_default()
    }

    fn remember(&self, assets: &[SafetyLocation]) {
        if let Ok(mut guard) = self.last_assets.lock() {
            *guard = assets.to_vec();
        }
        if let Err(e) = db::save_json(self.store.as_ref(), keys::CACHED_ASSETS, assets) {
            tracing::warn!(error = %e, "Failed to cache assets");
        }
    }

    fn fallback(&self) -> Vec<SafetyLocation> {
        let in_memory = self.last_assets();
        if !in_memory.is_empty() {
            tracing::debug!(count = in_memory.len(), "Serving last known assets");
            return in_memory;
        }

        match db::load_json::<Vec<SafetyLocation>>(self.store.as_ref(), keys::CACHED_ASSETS) {
            Ok(Some(cached)) => {
                tracing::debug!(count = cached.len(), "Serving cached assets");
                cached
            }
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "Asset cache unreadable");
                Vec::new()
            }
        }
    }
}
