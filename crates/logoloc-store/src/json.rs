// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Profile store backed by a single pretty-printed JSON document:
//
//   {
//     "invoice": { "name": "invoice", "mode": "edge", "left_mul": 0.0, ... },
//     "receipt": { "name": "receipt", "mode": "size", ... }
//   }
//
// Every operation re-reads the file, so edits made by hand between calls are
// picked up. Entries stay raw JSON until one is read: a damaged entry fails
// only its own `get`, and writes leave every other entry as it was. Writes go
// to a temp file in the same directory and are renamed into place.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use logoloc_core::error::{LocatorError, Result};
use logoloc_core::{LocatorConfig, Profile, ProfileRecord};
use tempfile::NamedTempFile;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::data_dir::{default_profiles_path, temp_profiles_path};
use crate::{ProfileStore, check_name, keyed};

// ---------------------------------------------------------------------------
// Local error helpers
// ---------------------------------------------------------------------------

fn store_err(path: &Path, action: &str, e: impl std::fmt::Display) -> LocatorError {
    LocatorError::Store(format!("{action} {}: {e}", path.display()))
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

pub struct JsonProfileStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl JsonProfileStore {
    /// Store at exactly `path`. Nothing is touched until the first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Store at the configured path if its directory can be created and
    /// written, else the per-user data directory, else the temp directory.
    #[instrument(skip_all)]
    pub fn resolve(config: &LocatorConfig) -> Self {
        let mut candidates = Vec::with_capacity(3);
        if let Some(path) = &config.profiles_path {
            candidates.push(path.clone());
        }
        candidates.push(default_profiles_path());
        candidates.push(temp_profiles_path());

        let last = candidates.len() - 1;
        for (i, path) in candidates.iter().enumerate() {
            if is_writable_location(path) {
                if i > 0 && config.profiles_path.is_some() {
                    warn!(
                        configured = ?config.profiles_path,
                        using = %path.display(),
                        "Profile store location not writable; using fallback"
                    );
                }
                debug!(path = %path.display(), "Profile store resolved");
                return Self::new(path.clone());
            }
            if i == last {
                warn!(path = %path.display(), "No writable profile store location; writes will fail");
            }
        }
        Self::new(candidates.swap_remove(last))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current document as raw entries. A missing file is empty; so is one
    /// that cannot be read or is not a JSON object, with a warning.
    fn load(&self) -> BTreeMap<String, Value> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return BTreeMap::new(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Profile store unreadable; treating as empty");
                return BTreeMap::new();
            }
        };
        match serde_json::from_str(&text) {
            Ok(map) => map,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Profile store malformed; treating as empty");
                BTreeMap::new()
            }
        }
    }

    fn save(&self, entries: &BTreeMap<String, Value>) -> Result<()> {
        let dir = parent_dir(&self.path);
        std::fs::create_dir_all(dir).map_err(|e| store_err(dir, "cannot create", e))?;

        let mut json = serde_json::to_string_pretty(entries)?;
        json.push('\n');

        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| store_err(dir, "cannot write in", e))?;
        tmp.write_all(json.as_bytes())
            .map_err(|e| store_err(&self.path, "cannot write", e))?;
        tmp.persist(&self.path)
            .map_err(|e| store_err(&self.path, "cannot replace", e.error))?;

        debug!(path = %self.path.display(), count = entries.len(), "Profile store saved");
        Ok(())
    }
}

/// Decode one stored entry.
fn decode(name: &str, value: Value) -> Result<ProfileRecord> {
    serde_json::from_value(value)
        .map_err(|e| LocatorError::InvalidInput(format!("stored profile '{name}' is malformed: {e}")))
}

impl ProfileStore for JsonProfileStore {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn get(&self, name: &str) -> Result<Option<Profile>> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        match self.load().remove(name) {
            Some(value) => decode(name, value).and_then(Profile::try_from).map(Some),
            None => Ok(None),
        }
    }

    #[instrument(skip(self, profile), fields(path = %self.path.display()))]
    fn upsert(&self, name: &str, profile: Profile) -> Result<Profile> {
        check_name(name)?;
        let (profile, record) = keyed(name, profile);

        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.load();
        entries.insert(name.to_string(), serde_json::to_value(record)?);
        self.save(&entries)?;

        info!(mode = ?profile.placement.mode(), "Profile saved");
        Ok(profile)
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn delete(&self, name: &str) -> Result<bool> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.load();
        if entries.remove(name).is_none() {
            return Ok(false);
        }
        self.save(&entries)?;
        info!("Profile deleted");
        Ok(true)
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn list(&self) -> Result<BTreeMap<String, ProfileRecord>> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut records = BTreeMap::new();
        for (name, value) in self.load() {
            match decode(&name, value) {
                Ok(record) => {
                    records.insert(name, record);
                }
                Err(e) => warn!(profile = %name, error = %e, "Skipping malformed stored profile"),
            }
        }
        Ok(records)
    }
}

// ---------------------------------------------------------------------------
// Location probing
// ---------------------------------------------------------------------------

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    }
}

/// Whether the directory holding `path` exists or can be created, and
/// accepts a new file.
fn is_writable_location(path: &Path) -> bool {
    let dir = parent_dir(path);
    std::fs::create_dir_all(dir).is_ok() && NamedTempFile::new_in(dir).is_ok()
}
