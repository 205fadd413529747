// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! User profile with emergency contact and medical details.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// Profile shown to responders during an SOS.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserProfile {
    #[validate(length(max = 100))]
    pub full_name: String,
    #[validate(length(max = 32))]
    pub phone: String,
    #[validate(length(max = 100))]
    pub emergency_contact_name: String,
    #[validate(length(max = 32))]
    pub emergency_contact_phone: String,
    #[serde(default)]
    #[validate(length(max = 8))]
    pub blood_type: Option<String>,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub medical_conditions: Option<String>,
}
