// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Process-local profile store.

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use logoloc_core::error::Result;
use logoloc_core::{Profile, ProfileRecord};

use crate::{ProfileStore, check_name, keyed};

/// Profiles held in memory for the lifetime of the value.
#[derive(Default)]
pub struct InMemoryProfileStore {
    profiles: Mutex<BTreeMap<String, ProfileRecord>>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProfileStore for InMemoryProfileStore {
    fn get(&self, name: &str) -> Result<Option<Profile>> {
        let profiles = self.profiles.lock().unwrap_or_else(PoisonError::into_inner);
        profiles.get(name).cloned().map(Profile::try_from).transpose()
    }

    fn upsert(&self, name: &str, profile: Profile) -> Result<Profile> {
        check_name(name)?;
        let (profile, record) = keyed(name, profile);
        self.profiles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), record);
        Ok(profile)
    }

    fn delete(&self, name: &str) -> Result<bool> {
        let mut profiles = self.profiles.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(profiles.remove(name).is_some())
    }

    fn list(&self) -> Result<BTreeMap<String, ProfileRecord>> {
        Ok(self
            .profiles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logoloc_core::{BoundingBox, ImageShape, Placement};

    #[test]
    fn stored_profile_computes_its_section() {
        let store = InMemoryProfileStore::new();
        let profile = Profile::new(
            "anything",
            Placement::Size {
                left_mul: 0.0,
                top_mul: 1.0,
                width_mul: 2.0,
                height_mul: 3.0,
            },
        );
        store.upsert("form-a", profile).unwrap();

        let loaded = store.get("form-a").unwrap().unwrap();
        assert_eq!(loaded.name, "form-a");
        let section = loaded
            .compute_bbox(ImageShape::new(800, 600), BoundingBox::new(300, 200, 100, 50))
            .unwrap();
        assert_eq!(section, BoundingBox::new(300, 250, 200, 150));
    }

    #[test]
    fn delete_and_list() {
        let store = InMemoryProfileStore::new();
        let edge = Placement::Edge {
            left_mul: 0.0,
            top_mul: 0.0,
            right_mul: 0.0,
            bottom_mul: 0.0,
        };
        store.upsert("b", Profile::new("b", edge)).unwrap();
        store.upsert("a", Profile::new("a", edge)).unwrap();
        assert_eq!(store.list().unwrap().keys().collect::<Vec<_>>(), ["a", "b"]);
        assert!(store.delete("a").unwrap());
        assert!(!store.delete("a").unwrap());
        assert!(store.get("a").unwrap().is_none());
    }
}
