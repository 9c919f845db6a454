// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// `logoloc cut`: crop the logo-relative section out of each image and record
// the outcome per file in `manifest.json`.

use std::path::Path;

use anyhow::{Context, Result};
use logoloc_core::config::LocatorConfig;
use logoloc_core::error::LocatorError;
use logoloc_core::{BoundingBox, DetectionMethod};
use logoloc_detect::ScanImage;
use logoloc_store::JsonProfileStore;
use serde::Serialize;
use tracing::{info, warn};

use crate::args::CutArgs;
use crate::session::{SectionSource, Session, collect_images, display_name, output_path};

pub const MANIFEST_FILE: &str = "manifest.json";

// ---------------------------------------------------------------------------
// Manifest
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManifestEntry {
    pub file: String,
    #[serde(flatten)]
    pub outcome: Outcome,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Ok {
        logo_bbox: BoundingBox,
        section_bbox: BoundingBox,
        method: DetectionMethod,
        confidence: f32,
    },
    LogoNotFound,
    ProfileNotFound {
        profile: String,
    },
    NoSectionParams,
    Error {
        error: String,
    },
}

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

pub fn run(config: &LocatorConfig, args: &CutArgs) -> Result<()> {
    let session = Session::open(config, &args.detection)?;
    let section = SectionSource::resolve(&args.section, || JsonProfileStore::resolve(config))?;

    let inputs = collect_images(&args.input)?;
    std::fs::create_dir_all(&args.out)
        .with_context(|| format!("creating output directory {}", args.out.display()))?;

    let manifest: Vec<ManifestEntry> = inputs
        .iter()
        .map(|path| ManifestEntry {
            file: display_name(path),
            outcome: cut_one(&session, &section, &args.out, path).unwrap_or_else(|err| {
                warn!(image = %path.display(), error = %err, "Section cut failed");
                Outcome::Error {
                    error: err.to_string(),
                }
            }),
        })
        .collect();

    let manifest_path = args.out.join(MANIFEST_FILE);
    std::fs::write(&manifest_path, serde_json::to_string_pretty(&manifest)?)
        .with_context(|| format!("writing {}", manifest_path.display()))?;

    let ok = manifest
        .iter()
        .filter(|e| matches!(e.outcome, Outcome::Ok { .. }))
        .count();
    info!(total = manifest.len(), ok, manifest = %manifest_path.display(), "Cut finished");
    println!(
        "{ok} of {} sections written; see {}",
        manifest.len(),
        manifest_path.display()
    );
    Ok(())
}

fn cut_one(
    session: &Session,
    section: &SectionSource,
    out_dir: &Path,
    path: &Path,
) -> Result<Outcome, LocatorError> {
    let image = ScanImage::open(path)?;
    let Some(found) = session.detect(&image) else {
        return Ok(Outcome::LogoNotFound);
    };

    let section_bbox = match section.compute(image.shape(), found.bbox) {
        Ok(bbox) => bbox,
        Err(LocatorError::ProfileNotFound(profile)) => {
            return Ok(Outcome::ProfileNotFound { profile });
        }
        Err(LocatorError::DegenerateGeometry(_)) => return Ok(Outcome::NoSectionParams),
        Err(err) => return Err(err),
    };

    image
        .crop(section_bbox)?
        .save(output_path(out_dir, path, "section"))?;

    Ok(Outcome::Ok {
        logo_bbox: found.bbox,
        section_bbox,
        method: found.method,
        confidence: found.confidence,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::{DetectionArgs, MethodArg, SectionArgs};
    use crate::test_support::write_fixture;

    #[test]
    fn manifest_entries_are_tagged() {
        let entry = ManifestEntry {
            file: "a.png".into(),
            outcome: Outcome::ProfileNotFound {
                profile: "invoice".into(),
            },
        };
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"file": "a.png", "status": "profile_not_found", "profile": "invoice"})
        );

        let value = serde_json::to_value(ManifestEntry {
            file: "b.png".into(),
            outcome: Outcome::NoSectionParams,
        })
        .unwrap();
        assert_eq!(value["status"], "no_section_params");
    }

    #[test]
    fn cuts_sections_and_writes_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let (template, scans) = write_fixture(dir.path());
        let out = dir.path().join("out");
        let args = CutArgs {
            input: scans,
            detection: DetectionArgs {
                template: Some(template),
                method: MethodArg::Template,
            },
            out: out.clone(),
            section: SectionArgs {
                section_left_mul: Some(0.0),
                section_top_mul: Some(1.0),
                section_right_mul: Some(0.0),
                section_bottom_mul: Some(2.0),
                ..SectionArgs::default()
            },
        };

        run(&LocatorConfig::default(), &args).unwrap();

        let manifest: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(out.join(MANIFEST_FILE)).unwrap())
                .unwrap();
        let entries = manifest.as_array().unwrap();
        assert_eq!(entries.len(), 3);

        // Sorted: blank.png, broken.png, form.png.
        assert_eq!(entries[0]["file"], "blank.png");
        assert_eq!(entries[1]["status"], "error");
        assert_eq!(entries[2]["status"], "ok");
        assert_eq!(entries[2]["logo_bbox"], serde_json::json!([300, 200, 100, 50]));
        assert_eq!(entries[2]["section_bbox"], serde_json::json!([300, 250, 100, 100]));

        let section = image::open(out.join("form_section.png")).unwrap();
        assert_eq!((section.width(), section.height()), (100, 100));
    }

    #[test]
    fn missing_profile_is_recorded_per_file() {
        let dir = tempfile::tempdir().unwrap();
        let (template, scans) = write_fixture(dir.path());
        let out = dir.path().join("out");
        let config = LocatorConfig {
            profiles_path: Some(dir.path().join("profiles.json")),
            ..LocatorConfig::default()
        };
        let args = CutArgs {
            input: scans.join("form.png"),
            detection: DetectionArgs {
                template: Some(template),
                method: MethodArg::Template,
            },
            out: out.clone(),
            section: SectionArgs {
                profile: Some("ghost".into()),
                ..SectionArgs::default()
            },
        };

        run(&config, &args).unwrap();

        let manifest: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(out.join(MANIFEST_FILE)).unwrap())
                .unwrap();
        assert_eq!(
            manifest,
            serde_json::json!([{"file": "form.png", "status": "profile_not_found", "profile": "ghost"}])
        );
    }
}
