// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Per-user data directory resolution.

use std::path::PathBuf;

/// File name of the profile document inside a data directory.
pub const PROFILES_FILE: &str = "profiles.json";

const APP_DIR: &str = "logoloc";

/// `$XDG_DATA_HOME/logoloc`, else `$HOME/.local/share/logoloc`, else a
/// `logoloc` directory under the system temp dir. Not created here.
pub fn data_dir() -> PathBuf {
    data_dir_with(|key| std::env::var(key).ok())
}

/// Default location of the profile document.
pub fn default_profiles_path() -> PathBuf {
    data_dir().join(PROFILES_FILE)
}

/// Last-resort location when nothing else is writable.
pub fn temp_profiles_path() -> PathBuf {
    std::env::temp_dir().join(APP_DIR).join(PROFILES_FILE)
}

/// [`data_dir`] with an explicit environment lookup. Empty values count as
/// unset.
pub fn data_dir_with(env: impl Fn(&str) -> Option<String>) -> PathBuf {
    let var = |key: &str| env(key).filter(|v| !v.is_empty());
    let base = if let Some(xdg) = var("XDG_DATA_HOME") {
        PathBuf::from(xdg)
    } else if let Some(home) = var("HOME") {
        PathBuf::from(home).join(".local").join("share")
    } else {
        std::env::temp_dir()
    };
    base.join(APP_DIR)
}
