// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// State shared by the image commands: the loaded template, the locator, the
// input file list, and the requested section.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use logoloc_core::config::LocatorConfig;
use logoloc_core::error::LocatorError;
use logoloc_core::{BoundingBox, DetectionResult, ImageShape, MethodChoice, Profile, SectionSpec};
use logoloc_detect::{Locator, ScanImage};
use logoloc_store::ProfileStore;
use tracing::{debug, info, warn};

use crate::args::{DetectionArgs, SectionArgs};

/// Extensions picked up when the input is a directory.
const IMAGE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "tif", "tiff", "bmp"];

// ---------------------------------------------------------------------------
// Detection session
// ---------------------------------------------------------------------------

pub struct Session {
    locator: Locator,
    template: ScanImage,
    method: MethodChoice,
}

impl Session {
    /// Load the template once and build both detectors.
    pub fn open(config: &LocatorConfig, args: &DetectionArgs) -> Result<Self> {
        let path = template_path(config, args)?;
        let template = ScanImage::open(&path)
            .with_context(|| format!("loading template {}", path.display()))?;
        info!(
            template = %path.display(),
            width = template.width(),
            height = template.height(),
            "Template loaded"
        );
        Ok(Self {
            locator: Locator::new(&config.detection),
            template,
            method: args.method.into(),
        })
    }

    pub fn detect(&self, image: &ScanImage) -> Option<DetectionResult> {
        self.locator.detect_logo(image, &self.template, self.method)
    }
}

/// `--template`, else the configured default.
pub fn template_path(config: &LocatorConfig, args: &DetectionArgs) -> Result<PathBuf, LocatorError> {
    args.template
        .clone()
        .or_else(|| config.default_template.clone())
        .ok_or_else(|| {
            LocatorError::InvalidInput(
                "no template given: pass --template or set LOGO_TEMPLATE_PATH".into(),
            )
        })
}

// ---------------------------------------------------------------------------
// Inputs and outputs
// ---------------------------------------------------------------------------

/// The input itself, or the image files directly inside it, sorted.
pub fn collect_images(input: &Path) -> Result<Vec<PathBuf>> {
    if !input.is_dir() {
        return Ok(vec![input.to_path_buf()]);
    }

    let mut paths = Vec::new();
    let entries =
        std::fs::read_dir(input).with_context(|| format!("reading directory {}", input.display()))?;
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && has_image_extension(&path) {
            paths.push(path);
        }
    }
    paths.sort();
    debug!(dir = %input.display(), count = paths.len(), "Collected input images");
    Ok(paths)
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.iter().any(|known| ext.eq_ignore_ascii_case(known)))
}

/// `<out_dir>/<stem>_<suffix>.png`
pub fn output_path(out_dir: &Path, input: &Path, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    out_dir.join(format!("{stem}_{suffix}.png"))
}

/// Bare file name for reports.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ---------------------------------------------------------------------------
// Section selection
// ---------------------------------------------------------------------------

/// Where the secondary rectangle comes from, resolved once per run.
#[derive(Debug, Clone, PartialEq)]
pub enum SectionSource {
    /// No profile and no multipliers.
    Nothing,
    Profile(Profile),
    /// A profile was named but the store does not have it.
    MissingProfile(String),
    Multipliers(SectionSpec),
}

impl SectionSource {
    /// The store is only opened when a profile is named.
    pub fn resolve<S, F>(args: &SectionArgs, open_store: F) -> Result<Self, LocatorError>
    where
        S: ProfileStore,
        F: FnOnce() -> S,
    {
        if let Some(name) = &args.profile {
            return Ok(match open_store().get(name)? {
                Some(profile) => Self::Profile(profile),
                None => {
                    warn!(profile = %name, "Profile not found");
                    Self::MissingProfile(name.clone())
                }
            });
        }

        let spec = args.spec();
        Ok(if spec.is_empty() {
            Self::Nothing
        } else {
            Self::Multipliers(spec)
        })
    }

    pub fn is_requested(&self) -> bool {
        !matches!(self, Self::Nothing)
    }

    /// Stroke width stored with the profile, if any.
    pub fn profile_thickness(&self) -> Option<u32> {
        match self {
            Self::Profile(profile) => Some(profile.section_thickness),
            _ => None,
        }
    }

    pub fn compute(&self, shape: ImageShape, logo: BoundingBox) -> Result<BoundingBox, LocatorError> {
        match self {
            Self::Nothing => Err(LocatorError::DegenerateGeometry(
                "no profile or section multipliers given".into(),
            )),
            Self::Profile(profile) => profile.compute_bbox(shape, logo),
            Self::MissingProfile(name) => Err(LocatorError::ProfileNotFound(name.clone())),
            Self::Multipliers(spec) => spec.compute_bbox(shape, logo),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::MethodArg;
    use logoloc_core::Placement;
    use logoloc_store::InMemoryProfileStore;

    fn detection(template: Option<&str>) -> DetectionArgs {
        DetectionArgs {
            template: template.map(PathBuf::from),
            method: MethodArg::Auto,
        }
    }

    #[test]
    fn template_flag_wins_over_config() {
        let config = LocatorConfig {
            default_template: Some(PathBuf::from("/cfg/logo.png")),
            ..LocatorConfig::default()
        };
        assert_eq!(
            template_path(&config, &detection(Some("cli.png"))).unwrap(),
            PathBuf::from("cli.png")
        );
        assert_eq!(
            template_path(&config, &detection(None)).unwrap(),
            PathBuf::from("/cfg/logo.png")
        );
    }

    #[test]
    fn missing_template_is_invalid_input() {
        let err = template_path(&LocatorConfig::default(), &detection(None)).unwrap_err();
        assert!(matches!(err, LocatorError::InvalidInput(_)));
    }

    #[test]
    fn directory_scan_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.PNG", "a.jpg", "c.tiff", "notes.txt", "d.gif"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        std::fs::create_dir(dir.path().join("sub.png")).unwrap();

        let names: Vec<String> = collect_images(dir.path())
            .unwrap()
            .iter()
            .map(|p| display_name(p))
            .collect();
        assert_eq!(names, ["a.jpg", "b.PNG", "c.tiff"]);
    }

    #[test]
    fn single_file_is_passed_through() {
        let paths = collect_images(Path::new("scan.png")).unwrap();
        assert_eq!(paths, [PathBuf::from("scan.png")]);
    }

    #[test]
    fn output_names_use_the_stem() {
        assert_eq!(
            output_path(Path::new("out"), Path::new("/scans/form 1.jpg"), "section"),
            PathBuf::from("out/form 1_section.png")
        );
    }

    #[test]
    fn section_from_stored_profile() {
        let store = InMemoryProfileStore::new();
        let placement = Placement::Edge {
            left_mul: 0.0,
            top_mul: 1.0,
            right_mul: 1.0,
            bottom_mul: 3.0,
        };
        store.upsert("invoice", Profile::new("invoice", placement)).unwrap();

        let args = SectionArgs {
            profile: Some("invoice".into()),
            ..SectionArgs::default()
        };
        let source = SectionSource::resolve(&args, || store).unwrap();
        assert_eq!(source.profile_thickness(), Some(3));
        let bbox = source
            .compute(ImageShape::new(800, 600), BoundingBox::new(300, 200, 100, 50))
            .unwrap();
        assert_eq!(bbox, BoundingBox::new(300, 250, 200, 150));
    }

    #[test]
    fn unknown_profile_is_remembered_not_fatal() {
        let args = SectionArgs {
            profile: Some("ghost".into()),
            ..SectionArgs::default()
        };
        let source = SectionSource::resolve(&args, InMemoryProfileStore::new).unwrap();
        assert_eq!(source, SectionSource::MissingProfile("ghost".into()));
        assert!(matches!(
            source.compute(ImageShape::new(10, 10), BoundingBox::new(0, 0, 1, 1)),
            Err(LocatorError::ProfileNotFound(_))
        ));
    }

    #[test]
    fn multipliers_without_profile_skip_the_store() {
        let args = SectionArgs {
            section_left_mul: Some(0.0),
            section_top_mul: Some(1.0),
            section_width_mul: Some(2.0),
            ..SectionArgs::default()
        };
        let source = SectionSource::resolve(&args, || -> InMemoryProfileStore {
            panic!("store must not be opened")
        })
        .unwrap();
        assert!(source.is_requested());
        assert!(matches!(
            source.compute(ImageShape::new(800, 600), BoundingBox::new(0, 0, 10, 10)),
            Err(LocatorError::DegenerateGeometry(_))
        ));
    }

    #[test]
    fn no_section_arguments_means_nothing() {
        let source =
            SectionSource::resolve(&SectionArgs::default(), InMemoryProfileStore::new).unwrap();
        assert!(!source.is_requested());
    }
}
