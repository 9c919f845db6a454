// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// `logoloc profiles`: list, show, save, and remove section profiles.

use anyhow::Result;
use logoloc_core::error::LocatorError;
use logoloc_core::{Profile, ProfileRecord};
use logoloc_store::ProfileStore;

use crate::args::{ProfilesCommand, PutArgs};

pub fn run(store: &dyn ProfileStore, command: &ProfilesCommand) -> Result<()> {
    let output = execute(store, command)?;
    println!("{output}");
    Ok(())
}

/// Perform `command` and return what should be printed.
fn execute(store: &dyn ProfileStore, command: &ProfilesCommand) -> Result<String> {
    Ok(match command {
        ProfilesCommand::List => serde_json::to_string_pretty(&store.list()?)?,
        ProfilesCommand::Get { name } => {
            let profile = store
                .get(name)?
                .ok_or_else(|| LocatorError::ProfileNotFound(name.clone()))?;
            serde_json::to_string_pretty(&ProfileRecord::from(profile))?
        }
        ProfilesCommand::Put(put) => {
            let saved = store.upsert(&put.name, profile_from(put)?)?;
            serde_json::to_string_pretty(&ProfileRecord::from(saved))?
        }
        ProfilesCommand::Delete { name } => {
            if !store.delete(name)? {
                return Err(LocatorError::ProfileNotFound(name.clone()).into());
            }
            format!("Deleted profile '{name}'")
        }
    })
}

/// Validates through the persisted record, so a size profile without
/// `--width-mul` fails the same way a hand-edited file would.
fn profile_from(put: &PutArgs) -> Result<Profile, LocatorError> {
    Profile::try_from(ProfileRecord {
        name: put.name.clone(),
        mode: put.mode.into(),
        left_mul: put.left_mul,
        top_mul: put.top_mul,
        right_mul: put.right_mul,
        bottom_mul: put.bottom_mul,
        width_mul: put.width_mul,
        height_mul: put.height_mul,
        section_thickness: put.section_thickness,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::ModeArg;
    use logoloc_core::ProfileMode;
    use logoloc_store::InMemoryProfileStore;

    fn put(name: &str, mode: ModeArg) -> PutArgs {
        PutArgs {
            name: name.into(),
            mode,
            left_mul: 0.0,
            top_mul: 1.0,
            right_mul: Some(1.0),
            bottom_mul: Some(3.0),
            width_mul: None,
            height_mul: None,
            section_thickness: 5,
        }
    }

    #[test]
    fn put_get_list_delete() {
        let store = InMemoryProfileStore::new();
        execute(&store, &ProfilesCommand::Put(put("invoice", ModeArg::Edge))).unwrap();

        let shown: ProfileRecord = serde_json::from_str(
            &execute(&store, &ProfilesCommand::Get { name: "invoice".into() }).unwrap(),
        )
        .unwrap();
        assert_eq!(shown.mode, ProfileMode::Edge);
        assert_eq!(shown.section_thickness, 5);

        let listed: serde_json::Value =
            serde_json::from_str(&execute(&store, &ProfilesCommand::List).unwrap()).unwrap();
        assert!(listed.get("invoice").is_some());

        execute(&store, &ProfilesCommand::Delete { name: "invoice".into() }).unwrap();
        let err = execute(&store, &ProfilesCommand::Delete { name: "invoice".into() }).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LocatorError>(),
            Some(LocatorError::ProfileNotFound(_))
        ));
    }

    #[test]
    fn size_profile_requires_width_and_height() {
        let store = InMemoryProfileStore::new();
        let err = execute(&store, &ProfilesCommand::Put(put("receipt", ModeArg::Size))).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LocatorError>(),
            Some(LocatorError::InvalidInput(_))
        ));
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn missing_profile_get_is_an_error() {
        let store = InMemoryProfileStore::new();
        assert!(execute(&store, &ProfilesCommand::Get { name: "nope".into() }).is_err());
    }
}
