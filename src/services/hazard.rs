// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Simulated danger zones around a position.
//!
//! Illustrative only: zones are random and regenerated wholesale on every
//! accepted position.

use crate::models::{Coordinate, SafetyLocation};
use geo::{coord, Rect};
use rand::Rng;

/// Number of zones per generation.
pub const HAZARD_COUNT: usize = 3;

/// Maximum offset from the center on each axis, in degrees.
pub const HAZARD_SPREAD_DEGREES: f64 = 0.02;

const HAZARD_DESCRIPTION: &str = "Area of concentrated criminal activity or civil unrest.";

/// Generates simulated hazard zones.
#[derive(Debug, Clone, Copy, Default)]
pub struct HazardZoneGenerator;

impl HazardZoneGenerator {
    /// Generate zones around `center` using the thread RNG and current time.
    pub fn generate(&self, center: Coordinate) -> Vec<SafetyLocation> {
        let now_ms = chrono::Utc::now().timestamp_millis();
        self.generate_with(center, now_ms, &mut rand::rng())
    }

    /// Deterministic variant for callers that own the clock and RNG.
    pub fn generate_with<R: Rng>(
        &self,
        center: Coordinate,
        now_ms: i64,
        rng: &mut R,
    ) -> Vec<SafetyLocation> {
        (0..HAZARD_COUNT)
            .map(|i| {
                let coords = center.offset(
                    rng.random_range(-HAZARD_SPREAD_DEGREES..HAZARD_SPREAD_DEGREES),
                    rng.random_range(-HAZARD_SPREAD_DEGREES..HAZARD_SPREAD_DEGREES),
                );
                let risk_level: u8 = rng.random_range(7..10);
                SafetyLocation::hazard(
                    format!("danger-spot-{i}-{now_ms}"),
                    format!("High Risk Sector {}", i + 1),
                    coords,
                    risk_level,
                    HAZARD_DESCRIPTION,
                )
            })
            .collect()
    }

    /// Box every generated zone falls inside.
    pub fn bounds(center: Coordinate) -> Rect<f64> {
        Rect::new(
            coord! { x: center.lng - HAZARD_SPREAD_DEGREES, y: center.lat - HAZARD_SPREAD_DEGREES },
            coord! { x: center.lng + HAZARD_SPREAD_DEGREES, y: center.lat + HAZARD_SPREAD_DEGREES },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LocationType;
    use geo::{Intersects, Point};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    const CENTER: Coordinate = Coordinate::new(-26.2041, 28.0473);

    #[test]
    fn test_generates_three_danger_zones() {
        let mut rng = StdRng::seed_from_u64(7);
        for round in 0..200 {
            let zones = HazardZoneGenerator.generate_with(CENTER, round, &mut rng);
            assert_eq!(zones.len(), 3);
            for zone in &zones {
                assert_eq!(zone.location_type, LocationType::DangerZone);
                assert!(matches!(zone.risk_level, Some(7..=9)), "{:?}", zone.risk_level);
                assert!(zone.safety_score.is_none());
                assert!((zone.coords.lat - CENTER.lat).abs() <= HAZARD_SPREAD_DEGREES + 1e-12);
                assert!((zone.coords.lng - CENTER.lng).abs() <= HAZARD_SPREAD_DEGREES + 1e-12);
                assert!(zone.is_consistent());
            }
        }
    }

    #[test]
    fn test_ids_and_names() {
        let mut rng = StdRng::seed_from_u64(1);
        let zones = HazardZoneGenerator.generate_with(CENTER, 1_700_000_000_000, &mut rng);
        let ids: Vec<&str> = zones.iter().map(|z| z.id.as_str()).collect();
        assert_eq!(
            ids,
            [
                "danger-spot-0-1700000000000",
                "danger-spot-1-1700000000000",
                "danger-spot-2-1700000000000"
            ]
        );
        assert_eq!(zones[2].name, "High Risk Sector 3");
        assert_eq!(zones[0].description.as_deref(), Some(HAZARD_DESCRIPTION));
        assert_eq!(ids.iter().collect::<HashSet<_>>().len(), 3);
    }

    #[test]
    fn test_zones_inside_bounds() {
        let bounds = HazardZoneGenerator::bounds(CENTER);
        for zone in HazardZoneGenerator.generate(CENTER) {
            let p: Point<f64> = zone.coords.into();
            assert!(bounds.intersects(&p));
        }
    }

    #[test]
    fn test_regeneration_replaces_set() {
        let mut rng = StdRng::seed_from_u64(3);
        let first = HazardZoneGenerator.generate_with(CENTER, 1, &mut rng);
        let second = HazardZoneGenerator.generate_with(CENTER, 2, &mut rng);
        assert!(first.iter().all(|z| !second.iter().any(|s| s.id == z.id)));
    }
}
