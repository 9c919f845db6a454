// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Logoloc.

use thiserror::Error;

/// Top-level error type for all Logoloc operations.
///
/// Detectors never produce `NotFound` themselves: they return `None` so the
/// locator can fall back from one method to the next. The variant exists for
/// callers that want to surface "logo absent" through a `Result`.
#[derive(Debug, Error)]
pub enum LocatorError {
    // -- Detection --
    #[error("logo not found")]
    NotFound,

    // -- Caller input --
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),

    #[error("image processing failed: {0}")]
    ImageError(String),

    // -- Profiles --
    #[error("profile '{0}' not found")]
    ProfileNotFound(String),

    #[error("profile store error: {0}")]
    Store(String),

    // -- Configuration / persistence --
    #[error("configuration error: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, LocatorError>;
