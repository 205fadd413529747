// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Profile and evidence library persistence.

use crate::db::{self, keys, KeyValueStore, StoreError};
use crate::models::{LibraryImage, UserProfile};
use std::sync::{Arc, Mutex, MutexGuard};
use validator::Validate;

#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("Validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Evidence not found: {0}")]
    NotFound(String),
}

/// Reads and writes the user profile and the evidence library.
#[derive(Clone)]
pub struct RecordService {
    store: Arc<dyn KeyValueStore>,
    /// Held across read-modify-write of the evidence library
    vault_lock: Arc<Mutex<()>>,
}

impl RecordService {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            vault_lock: Arc::new(Mutex::new(())),
        }
    }

    fn lock_vault(&self) -> MutexGuard<'_, ()> {
        self.vault_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Library for modification. Unlike [`library`](Self::library), a
    /// read failure is an error so the vault is never overwritten blind.
    fn load_vault(&self) -> Result<Vec<LibraryImage>, RecordError> {
        Ok(db::load_json(self.store.as_ref(), keys::EVIDENCE_VAULT)?.unwrap_or_default())
    }

    /// Saved profile, or the empty default if none was saved.
    ///
    /// An unreadable profile is logged and treated as missing.
    pub fn profile(&self) -> UserProfile {
        match db::load_json(self.store.as_ref(), keys::PROFILE) {
            Ok(Some(profile)) => profile,
            Ok(None) => UserProfile::default(),
            Err(e) => {
                tracing::error!(error = %e, "Failed to load profile");
                UserProfile::default()
            }
        }
    }

    /// Validate and overwrite the profile.
    pub fn save_profile(&self, profile: &UserProfile) -> Result<(), RecordError> {
        profile.validate()?;
        db::save_json(self.store.as_ref(), keys::PROFILE, profile)?;
        tracing::info!("Profile saved");
        Ok(())
    }

    /// Evidence items, newest first.
    pub fn library(&self) -> Vec<LibraryImage> {
        match db::load_json(self.store.as_ref(), keys::EVIDENCE_VAULT) {
            Ok(Some(images)) => images,
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::error!(error = %e, "Failed to load evidence library");
                Vec::new()
            }
        }
    }

    /// Store a new item at the front of the library.
    pub fn add_evidence(
        &self,
        url: String,
        analysis: Option<String>,
    ) -> Result<LibraryImage, RecordError> {
        let now = chrono::Utc::now();
        let _guard = self.lock_vault();
        let mut images = self.load_vault()?;

        let id = unique_id(&images, now.timestamp_millis().to_string());

        let image = LibraryImage {
            id,
            url,
            timestamp: now.to_rfc3339(),
            analysis,
        };
        images.insert(0, image.clone());
        db::save_json(self.store.as_ref(), keys::EVIDENCE_VAULT, &images)?;

        tracing::info!(id = %image.id, count = images.len(), "Evidence stored");
        Ok(image)
    }

    pub fn delete_evidence(&self, id: &str) -> Result<(), RecordError> {
        let _guard = self.lock_vault();
        let mut images = self.load_vault()?;
        let before = images.len();
        images.retain(|img| img.id != id);
        if images.len() == before {
            return Err(RecordError::NotFound(id.to_string()));
        }
        db::save_json(self.store.as_ref(), keys::EVIDENCE_VAULT, &images)?;
        tracing::info!(id, "Evidence deleted");
        Ok(())
    }
}

/// `base`, or `base-N` with the smallest N not already taken.
fn unique_id(images: &[LibraryImage], base: String) -> String {
    let taken = |candidate: &str| images.iter().any(|img| img.id == candidate);
    if !taken(&base) {
        return base;
    }
    let mut n = 1;
    loop {
        let candidate = format!("{base}-{n}");
        if !taken(&candidate) {
            return candidate;
        }
        n += 1;
    }
}
