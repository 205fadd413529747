// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Safety state engine.
//!
//! Turns an accepted position into a score, classifies it into a tier and
//! decides whether the transition must raise an alert. Scoring sits behind
//! [`SafetyScoreEstimator`] so the simulated model can be swapped for a
//! real one without touching the tier contract.

use crate::models::safety::INITIAL_SCORE;
use crate::models::{Coordinate, Evaluation, SafetyLocation, SafetyTier};
use crate::services::movement::haversine_distance;
use rand::Rng;
use std::collections::VecDeque;
use std::ops::Range;
use std::sync::{Arc, Mutex, RwLock};

/// Produces a 0-100 safety score for a position.
pub trait SafetyScoreEstimator: Send + Sync {
    fn estimate(&self, position: Coordinate) -> u8;

    /// Called with the latest hazard set before each evaluation.
    fn observe_hazards(&self, _hazards: &[SafetyLocation]) {}
}

/// Uniform random score, the demo model.
#[derive(Debug, Clone)]
pub struct RandomScoreEstimator {
    range: Range<u8>,
}

impl Default for RandomScoreEstimator {
    fn default() -> Self {
        Self { range: 30..100 }
    }
}

impl RandomScoreEstimator {
    /// Scores are drawn from `range` (end exclusive), capped at 100.
    pub fn with_range(range: Range<u8>) -> Self {
        let end = range.end.clamp(1, 101);
        let start = range.start.min(end.saturating_sub(1));
        Self { range: start..end }
    }
}

impl SafetyScoreEstimator for RandomScoreEstimator {
    fn estimate(&self, _position: Coordinate) -> u8 {
        rand::rng().random_range(self.range.clone())
    }
}

/// Scores a position by its distance to known hazards.
///
/// Every hazard within `radius_m` subtracts up to `risk_level * 5` points,
/// scaled linearly by proximity.
#[derive(Debug)]
pub struct HazardProximityEstimator {
    radius_m: f64,
    hazards: RwLock<Vec<SafetyLocation>>,
}

impl HazardProximityEstimator {
    pub fn new(radius_m: f64) -> Self {
        Self {
            radius_m,
            hazards: RwLock::new(Vec::new()),
        }
    }

    fn penalty(&self, position: Coordinate, hazard: &SafetyLocation) -> f64 {
        let Some(risk) = hazard.risk_level else {
            return 0.0;
        };
        let d = haversine_distance(position, hazard.coords);
        if d >= self.radius_m {
            return 0.0;
        }
        f64::from(risk) * 5.0 * (1.0 - d / self.radius_m)
    }
}

impl SafetyScoreEstimator for HazardProximityEstimator {
    fn estimate(&self, position: Coordinate) -> u8 {
        let Ok(hazards) = self.hazards.read() else {
            return INITIAL_SCORE;
        };
        let penalty: f64 = hazards.iter().map(|h| self.penalty(position, h)).sum();
        (100.0 - penalty).round().clamp(0.0, 100.0) as u8
    }

    fn observe_hazards(&self, hazards: &[SafetyLocation]) {
        if let Ok(mut guard) = self.hazards.write() {
            *guard = hazards
                .iter()
                .filter(|h| h.location_type.is_hazard())
                .cloned()
                .collect();
        }
    }
}

/// Replays a fixed score sequence, repeating the last value once exhausted.
#[derive(Debug)]
pub struct ScriptedScoreEstimator {
    scores: Mutex<VecDeque<u8>>,
    last: Mutex<u8>,
}

impl ScriptedScoreEstimator {
    pub fn new(scores: impl IntoIterator<Item = u8>) -> Self {
        Self {
            scores: Mutex::new(scores.into_iter().collect()),
            last: Mutex::new(INITIAL_SCORE),
        }
    }
}

impl SafetyScoreEstimator for ScriptedScoreEstimator {
    fn estimate(&self, _position: Coordinate) -> u8 {
        let next = self.scores.lock().ok().and_then(|mut q| q.pop_front());
        let Ok(mut last) = self.last.lock() else {
            return next.unwrap_or(INITIAL_SCORE);
        };
        if let Some(score) = next {
            *last = score.min(100);
        }
        *last
    }
}

/// Edge trigger: entering DANGER from any other tier.
pub fn alert_transition(previous: SafetyTier, next: SafetyTier) -> bool {
    previous != SafetyTier::Danger && next == SafetyTier::Danger
}

/// Tier state machine driven by successive evaluations.
#[derive(Clone)]
pub struct SafetyEngine {
    estimator: Arc<dyn SafetyScoreEstimator>,
    score: u8,
    tier: SafetyTier,
}

impl SafetyEngine {
    pub fn new(estimator: Arc<dyn SafetyScoreEstimator>) -> Self {
        Self {
            estimator,
            score: INITIAL_SCORE,
            tier: SafetyTier::from_score(INITIAL_SCORE),
        }
    }

    pub fn current_tier(&self) -> SafetyTier {
        self.tier
    }

    pub fn current_score(&self) -> u8 {
        self.score
    }

    /// Forward the latest hazard set to the estimator.
    pub fn observe_hazards(&self, hazards: &[SafetyLocation]) {
        self.estimator.observe_hazards(hazards);
    }

    /// Score the position and advance the state machine.
    pub fn evaluate(&mut self, position: Coordinate) -> Evaluation {
        let score = self.estimator.estimate(position);
        self.apply_score(score)
    }

    /// Advance the state machine with an already computed score.
    pub fn apply_score(&mut self, score: u8) -> Evaluation {
        let score = score.min(100);
        let tier = SafetyTier::from_score(score);
        let alert = alert_transition(self.tier, tier);

        if tier != self.tier {
            tracing::info!(from = %self.tier, to = %tier, score, "Safety tier changed");
        }
        self.score = score;
        self.tier = tier;

        Evaluation { score, tier, alert }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LocationType;

    const HERE: Coordinate = Coordinate::new(-26.2041, 28.0473);

    #[test]
    fn test_alert_transition_table() {
        use SafetyTier::*;
        assert!(alert_transition(Safe, Danger));
        assert!(alert_transition(Semi, Danger));
        assert!(!alert_transition(Danger, Danger));
        assert!(!alert_transition(Danger, Safe));
        assert!(!alert_transition(Safe, Semi));
    }

    #[test]
    fn test_alert_is_edge_triggered() {
        // SAFE, SEMI, DANGER, DANGER, SAFE, DANGER
        let estimator = Arc::new(ScriptedScoreEstimator::new([90, 60, 40, 30, 95, 10]));
        let mut engine = SafetyEngine::new(estimator);

        let fired: Vec<usize> = (0..6)
            .filter_map(|i| engine.evaluate(HERE).alert.then_some(i))
            .collect();

        assert_eq!(fired, vec![2, 5]);
        assert_eq!(engine.current_tier(), SafetyTier::Danger);
        assert_eq!(engine.current_score(), 10);
    }

    #[test]
    fn test_initial_state() {
        let engine = SafetyEngine::new(Arc::new(RandomScoreEstimator::default()));
        assert_eq!(engine.current_tier(), SafetyTier::Safe);
        assert_eq!(engine.current_score(), 85);
    }

    #[test]
    fn test_first_evaluation_into_danger_alerts() {
        let mut engine = SafetyEngine::new(Arc::new(ScriptedScoreEstimator::new([50])));
        let eval = engine.evaluate(HERE);
        assert_eq!(eval.tier, SafetyTier::Danger);
        assert!(eval.alert);
    }

    #[test]
    fn test_random_estimator_range() {
        let estimator = RandomScoreEstimator::default();
        for _ in 0..1_000 {
            let s = estimator.estimate(HERE);
            assert!((30..100).contains(&s), "score {s} out of range");
        }
    }

    #[test]
    fn test_random_estimator_range_is_capped() {
        let estimator = RandomScoreEstimator::with_range(90..250);
        for _ in 0..200 {
            assert!(estimator.estimate(HERE) <= 100);
        }
    }

    #[test]
    fn test_proximity_estimator() {
        let estimator = HazardProximityEstimator::new(2_000.0);
        assert_eq!(estimator.estimate(HERE), 100);

        let on_top = SafetyLocation::hazard("h0", "Sector 1", HERE, 9, "x");
        let far = SafetyLocation::hazard("h1", "Sector 2", HERE.offset(1.0, 1.0), 9, "x");
        let asset = SafetyLocation::asset("a0", "Clinic", LocationType::Hospital, HERE, 50);
        estimator.observe_hazards(&[on_top.clone(), far, asset]);

        // One risk-9 hazard at zero distance costs 45 points
        assert_eq!(estimator.estimate(HERE), 55);

        estimator.observe_hazards(&[on_top.clone(), on_top.clone(), on_top]);
        assert_eq!(estimator.estimate(HERE), 0);
    }

    #[test]
    fn test_scripted_repeats_last() {
        let estimator = ScriptedScoreEstimator::new([20, 70]);
        assert_eq!(estimator.estimate(HERE), 20);
        assert_eq!(estimator.estimate(HERE), 70);
        assert_eq!(estimator.estimate(HERE), 70);
    }
}
