// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Safety tiers and the per-session safety state.

use super::Coordinate;
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Score assumed before the first accepted position.
pub const INITIAL_SCORE: u8 = 85;

/// Coarse bucket derived from the numeric safety score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum SafetyTier {
    Safe,
    Semi,
    Danger,
}

impl SafetyTier {
    /// Classify a score: `> 80` SAFE, `51..=80` SEMI, `<= 50` DANGER.
    pub fn from_score(score: u8) -> Self {
        match score {
            81.. => SafetyTier::Safe,
            51..=80 => SafetyTier::Semi,
            _ => SafetyTier::Danger,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SafetyTier::Safe => "SAFE",
            SafetyTier::Semi => "SEMI",
            SafetyTier::Danger => "DANGER",
        }
    }
}

impl std::fmt::Display for SafetyTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of evaluating one accepted position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Evaluation {
    pub score: u8,
    pub tier: SafetyTier,
    /// True when this evaluation entered DANGER from another tier.
    pub alert: bool,
}

/// Derived, process-local state. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetyState {
    pub current_score: u8,
    pub current_tier: SafetyTier,
    pub last_accepted_position: Option<Coordinate>,
    /// Epoch milliseconds of the last accepted sample (0 before the first).
    pub last_accepted_timestamp: i64,
}

impl Default for SafetyState {
    fn default() -> Self {
        Self {
            current_score: INITIAL_SCORE,
            current_tier: SafetyTier::from_score(INITIAL_SCORE),
            last_accepted_position: None,
            last_accepted_timestamp: 0,
        }
    }
}

impl SafetyState {
    /// Record a gate-accepted sample.
    pub fn record_accepted(&mut self, position: Coordinate, now_ms: i64) {
        self.last_accepted_position = Some(position);
        self.last_accepted_timestamp = now_ms;
    }

    /// Record the outcome of an evaluation.
    pub fn apply(&mut self, evaluation: &Evaluation) {
        self.current_score = evaluation.score;
        self.current_tier = evaluation.tier;
    }
}
