// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Logoloc: core types, logo-relative geometry, section profiles, and error
// definitions shared across all crates.

pub mod config;
pub mod error;
pub mod geometry;
pub mod human_errors;
pub mod profile;
pub mod types;

pub use config::LocatorConfig;
pub use error::LocatorError;
pub use profile::{Placement, Profile, ProfileMode, ProfileRecord, SectionSpec};
pub use types::*;
