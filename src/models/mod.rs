// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod coords;
pub mod library;
pub mod location;
pub mod profile;
pub mod safety;

pub use coords::Coordinate;
pub use library::LibraryImage;
pub use location::{LocationType, SafetyLocation};
pub use profile::UserProfile;
pub use safety::{Evaluation, SafetyState, SafetyTier};
