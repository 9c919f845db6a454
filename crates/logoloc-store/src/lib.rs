// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// logoloc-store: persistence for named section profiles.
//
// Profiles live in one JSON object keyed by name. `JsonProfileStore` keeps it
// on disk and falls back to the per-user data directory when the configured
// location cannot be written; `InMemoryProfileStore` is the same contract
// without a file.

pub mod data_dir;
pub mod json;
pub mod memory;

use std::collections::BTreeMap;

use logoloc_core::error::{LocatorError, Result};
use logoloc_core::{Profile, ProfileRecord};

pub use json::JsonProfileStore;
pub use memory::InMemoryProfileStore;

/// Storage contract for named profiles.
///
/// Implementations serialize their own read-modify-write cycles, so a store
/// can be shared across threads behind a plain reference.
pub trait ProfileStore: Send + Sync {
    /// The profile stored under `name`, validated. A stored record missing
    /// its mode's multipliers is an `InvalidInput` error.
    fn get(&self, name: &str) -> Result<Option<Profile>>;

    /// Insert or replace the profile under `name`. The stored profile always
    /// carries `name`, whatever `profile.name` said.
    fn upsert(&self, name: &str, profile: Profile) -> Result<Profile>;

    /// Remove `name`. `false` if it was not present.
    fn delete(&self, name: &str) -> Result<bool>;

    /// Every stored record, keyed and ordered by name.
    fn list(&self) -> Result<BTreeMap<String, ProfileRecord>>;
}

/// Reject blank profile names before they reach a store.
pub(crate) fn check_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(LocatorError::InvalidInput(
            "profile name must not be empty".into(),
        ));
    }
    Ok(())
}

/// Apply PUT semantics: the key wins over the profile's own name.
pub(crate) fn keyed(name: &str, mut profile: Profile) -> (Profile, ProfileRecord) {
    profile.name = name.to_string();
    let record = ProfileRecord::from(profile.clone());
    (profile, record)
}
