// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Operator-facing error messages.
//
// Each technical error maps to a one-line summary and a concrete next step, so
// whoever is feeding scans through the tool can fix the input without reading
// a backtrace. Severity drives the CLI exit code.

use crate::error::LocatorError;

/// Severity of an error from the operator's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Filesystem hiccup; running the same command again may work.
    Transient,
    /// The operator must change an input (file, profile, parameters).
    ActionRequired,
    /// The input can never succeed as given.
    Permanent,
}

impl Severity {
    /// Process exit code used by the CLI.
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Transient => 75,
            Self::ActionRequired => 2,
            Self::Permanent => 1,
        }
    }
}

/// A plain-language error with an actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    pub message: String,
    pub suggestion: String,
    pub retriable: bool,
    pub severity: Severity,
}

/// Convert a `LocatorError` into something an operator can act on.
pub fn humanize_error(err: &LocatorError) -> HumanError {
    match err {
        // -- Detection --
        LocatorError::NotFound => HumanError {
            message: "The logo was not found on this page.".into(),
            suggestion: "Check that the template is cropped tightly around the logo and comes from the same form layout. Try --method template for faint or low-texture logos.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        // -- Input --
        LocatorError::InvalidInput(detail) => humanize_input_error(detail),

        LocatorError::DegenerateGeometry(detail) => HumanError {
            message: "The section rectangle is not fully specified.".into(),
            suggestion: format!(
                "Give left and top multipliers plus either right and bottom, or width and height. ({detail})"
            ),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        LocatorError::ImageError(_) => HumanError {
            message: "The image could not be processed.".into(),
            suggestion: "Re-export the scan as PNG or JPEG and try again.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        // -- Profiles --
        LocatorError::ProfileNotFound(name) => HumanError {
            message: format!("There is no profile called '{name}'."),
            suggestion: "Run `logoloc profiles list` to see the saved profiles, or create one with `logoloc profiles put`.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        LocatorError::Store(_) => HumanError {
            message: "The profile store could not be updated.".into(),
            suggestion: "Check that the profiles file location is writable, or point LOGO_PROFILES_PATH somewhere else.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        LocatorError::Config(detail) => HumanError {
            message: "The configuration could not be used.".into(),
            suggestion: format!("Fix the configuration file and try again. ({detail})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        LocatorError::Io(io_err) => match io_err.kind() {
            std::io::ErrorKind::NotFound => HumanError {
                message: "The file couldn't be found.".into(),
                suggestion: "Check the path. It may have been moved or deleted.".into(),
                retriable: false,
                severity: Severity::ActionRequired,
            },
            std::io::ErrorKind::PermissionDenied => HumanError {
                message: "Permission denied while reading or writing a file.".into(),
                suggestion: "Check the file permissions, or choose a different output directory.".into(),
                retriable: false,
                severity: Severity::ActionRequired,
            },
            _ => HumanError {
                message: "There was a problem reading or writing a file.".into(),
                suggestion: "Try again. If this keeps happening, the disk may be full.".into(),
                retriable: true,
                severity: Severity::Transient,
            },
        },

        LocatorError::Serialization(_) => HumanError {
            message: "A JSON document could not be read or written.".into(),
            suggestion: "Check that the file is valid JSON.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },
    }
}

fn humanize_input_error(detail: &str) -> HumanError {
    let lower = detail.to_ascii_lowercase();

    if lower.contains("decode") || lower.contains("format") {
        HumanError {
            message: "That file doesn't look like an image.".into(),
            suggestion: "Use a PNG, JPEG, TIFF, or BMP file.".into(),
            retriable: false,
            severity: Severity::Permanent,
        }
    } else if lower.contains("requires") {
        HumanError {
            message: "The profile is missing required multipliers.".into(),
            suggestion: format!("Save the profile again with all fields for its mode. ({detail})"),
            retriable: false,
            severity: Severity::ActionRequired,
        }
    } else {
        HumanError {
            message: "Some input was not valid.".into(),
            suggestion: format!("Check the command arguments. (Detail: {detail})"),
            retriable: false,
            severity: Severity::ActionRequired,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_action_required() {
        let human = humanize_error(&LocatorError::NotFound);
        assert_eq!(human.severity, Severity::ActionRequired);
        assert!(!human.retriable);
    }

    #[test]
    fn undecodable_image_is_permanent() {
        let err = LocatorError::InvalidInput("cannot decode image: unsupported format".into());
        assert_eq!(humanize_error(&err).severity, Severity::Permanent);
    }

    #[test]
    fn missing_profile_names_the_profile() {
        let human = humanize_error(&LocatorError::ProfileNotFound("invoice".into()));
        assert!(human.message.contains("invoice"));
    }

    #[test]
    fn store_failure_is_transient() {
        let human = humanize_error(&LocatorError::Store("disk full".into()));
        assert_eq!(human.severity, Severity::Transient);
        assert_eq!(human.severity.exit_code(), 75);
    }

    #[test]
    fn missing_file_is_action_required() {
        let err = LocatorError::Io(std::io::Error::from(std::io::ErrorKind::NotFound));
        assert_eq!(humanize_error(&err).severity, Severity::ActionRequired);
    }
}
