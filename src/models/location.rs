// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Safety assets and hazard zones shown on the map.

use super::Coordinate;
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Kind of location on the safety map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum LocationType {
    Police,
    Hospital,
    SafeHub,
    DangerZone,
}

impl LocationType {
    pub fn is_hazard(self) -> bool {
        self == LocationType::DangerZone
    }
}

/// A real safety asset or a synthetic hazard.
///
/// Hazards carry `risk_level` (1-10), assets carry `safety_score` (0-100).
/// Use [`SafetyLocation::hazard`] and [`SafetyLocation::asset`] to build
/// records so the right one is populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SafetyLocation {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub location_type: LocationType,
    pub coords: Coordinate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_level: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub safety_score: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl SafetyLocation {
    /// Build a danger zone. `risk_level` is clamped to 1..=10.
    pub fn hazard(
        id: impl Into<String>,
        name: impl Into<String>,
        coords: Coordinate,
        risk_level: u8,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            location_type: LocationType::DangerZone,
            coords,
            risk_level: Some(risk_level.clamp(1, 10)),
            safety_score: None,
            description: Some(description.into()),
            address: None,
        }
    }

    /// Build a non-hazard asset. `safety_score` is clamped to 0..=100.
    ///
    /// Passing `LocationType::DangerZone` is a caller bug; it is downgraded
    /// to `SafeHub` so the record stays consistent.
    pub fn asset(
        id: impl Into<String>,
        name: impl Into<String>,
        location_type: LocationType,
        coords: Coordinate,
        safety_score: u8,
    ) -> Self {
        let location_type = if location_type.is_hazard() {
            LocationType::SafeHub
        } else {
            location_type
        };
        Self {
            id: id.into(),
            name: name.into(),
            location_type,
            coords,
            risk_level: None,
            safety_score: Some(safety_score.min(100)),
            description: None,
            address: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// Exactly one of `risk_level` / `safety_score` is set, matching the type.
    pub fn is_consistent(&self) -> bool {
        if self.location_type.is_hazard() {
            matches!(self.risk_level, Some(1..=10)) && self.safety_score.is_none()
        } else {
            matches!(self.safety_score, Some(0..=100)) && self.risk_level.is_none()
        }
    }
}
