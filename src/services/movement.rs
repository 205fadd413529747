// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Movement gate: decides when a new fix justifies recomputing safety state.

use crate::models::Coordinate;

/// Mean Earth radius in metres.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Default minimum movement before recomputing.
pub const DEFAULT_MIN_DISTANCE_METERS: f64 = 100.0;

/// Default minimum time between recomputations.
pub const DEFAULT_MIN_INTERVAL_MS: i64 = 30_000;

/// Great-circle distance in metres (haversine formula).
pub fn haversine_distance(a: Coordinate, b: Coordinate) -> f64 {
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let d_phi = (b.lat - a.lat).to_radians();
    let d_lambda = (b.lng - a.lng).to_radians();

    let h = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    // Rounding can push h a hair past 1 for antipodal points
    let c = 2.0 * h.sqrt().min(1.0).asin();
    EARTH_RADIUS_METERS * c
}

/// Distance/time throttle for position samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementGate {
    pub min_distance_m: f64,
    pub min_interval_ms: i64,
}

impl Default for MovementGate {
    fn default() -> Self {
        Self {
            min_distance_m: DEFAULT_MIN_DISTANCE_METERS,
            min_interval_ms: DEFAULT_MIN_INTERVAL_MS,
        }
    }
}

impl MovementGate {
    pub fn new(min_distance_m: f64, min_interval_ms: i64) -> Self {
        Self {
            min_distance_m,
            min_interval_ms,
        }
    }

    /// Accept the first sample, or one that moved far enough, or one that
    /// arrived long enough after the last accepted sample.
    ///
    /// Pure; the caller records the accepted position and timestamp.
    pub fn accept(
        &self,
        new_position: Coordinate,
        last_accepted: Option<Coordinate>,
        last_accepted_ms: i64,
        now_ms: i64,
    ) -> bool {
        let Some(last) = last_accepted else {
            return true;
        };
        if now_ms.saturating_sub(last_accepted_ms) >= self.min_interval_ms {
            return true;
        }
        haversine_distance(new_position, last) >= self.min_distance_m
    }
}
