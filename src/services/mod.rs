// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod alert;
pub mod assets;
pub mod assistant;
pub mod gemini;
pub mod hazard;
pub mod movement;
pub mod position;
pub mod records;
pub mod retry;
pub mod safety;
pub mod sentinel;

pub use alert::{AlertNotifier, LogNotificationSink, NotificationPermission, NotificationSink};
pub use assets::{AssetResolver, AssetSource};
pub use assistant::SafetyAssistant;
pub use gemini::{GeminiClient, GeminiError};
pub use hazard::HazardZoneGenerator;
pub use movement::{haversine_distance, MovementGate};
pub use position::{ChannelPositionSource, PositionError, PositionSource, PositionWatch};
pub use records::RecordService;
pub use retry::RetryPolicy;
pub use safety::{RandomScoreEstimator, SafetyEngine, SafetyScoreEstimator};
pub use sentinel::{SentinelSession, SessionSnapshot};
