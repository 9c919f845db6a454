// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Locator configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{LocatorError, Result};

/// Environment variable naming the default logo template.
pub const ENV_TEMPLATE_PATH: &str = "LOGO_TEMPLATE_PATH";
/// Environment variable naming the profile store document.
pub const ENV_PROFILES_PATH: &str = "LOGO_PROFILES_PATH";

/// Smallest descriptor patch the ORB extractor accepts.
pub const MIN_PATCH_SIZE: u32 = 8;

/// Top-level settings, resolved once at startup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocatorConfig {
    /// Template used when a caller does not supply one.
    pub default_template: Option<PathBuf>,
    /// Location of the profiles JSON document.
    pub profiles_path: Option<PathBuf>,
    pub detection: DetectionConfig,
    pub annotation: AnnotationConfig,
}

/// Tuning for both detectors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    pub orb: OrbConfig,
    pub matching: MatchConfig,
    pub ransac: RansacConfig,
    pub template: TemplateConfig,
}

/// Keypoint extraction parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbConfig {
    /// Upper bound on keypoints per image.
    pub n_features: usize,
    /// Downscale ratio between pyramid levels.
    pub scale_factor: f32,
    pub n_levels: usize,
    /// FAST intensity threshold.
    pub fast_threshold: u8,
    /// Keypoints closer than this to a level border are discarded.
    pub edge_threshold: u32,
    pub patch_size: u32,
}

impl Default for OrbConfig {
    fn default() -> Self {
        Self {
            n_features: 2000,
            scale_factor: 1.2,
            n_levels: 8,
            fast_threshold: 20,
            edge_threshold: 31,
            patch_size: 31,
        }
    }
}

/// Descriptor matching parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Lowe ratio: nearest must be strictly below `ratio` times second nearest.
    pub ratio: f32,
    pub min_good_matches: usize,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            ratio: 0.75,
            min_good_matches: 10,
        }
    }
}

/// Robust homography estimation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RansacConfig {
    /// Maximum reprojection error, in pixels, for an inlier.
    pub reproj_threshold: f64,
    pub max_iters: usize,
    /// Target probability of drawing at least one all-inlier sample.
    pub confidence: f64,
    /// Fixed sampler seed; `None` draws from OS entropy.
    pub seed: Option<u64>,
}

impl Default for RansacConfig {
    fn default() -> Self {
        Self {
            reproj_threshold: 5.0,
            max_iters: 2000,
            confidence: 0.995,
            seed: None,
        }
    }
}

/// Multi-scale edge template parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateConfig {
    pub canny_low: f32,
    pub canny_high: f32,
    /// Scaled templates narrower or shorter than this are skipped.
    pub min_template_side: u32,
    pub scales: Vec<f64>,
}

impl TemplateConfig {
    /// 33 scales from 0.4 to 2.0 in steps of 0.05.
    pub fn default_scales() -> Vec<f64> {
        (0..33).map(|i| f64::from(40 + 5 * i) / 100.0).collect()
    }
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            canny_low: 50.0,
            canny_high: 150.0,
            min_template_side: 8,
            scales: Self::default_scales(),
        }
    }
}

/// Stroke widths for annotated output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotationConfig {
    pub bbox_thickness: u32,
    pub section_thickness: u32,
}

impl Default for AnnotationConfig {
    fn default() -> Self {
        Self {
            bbox_thickness: 4,
            section_thickness: crate::profile::DEFAULT_SECTION_THICKNESS,
        }
    }
}

impl LocatorConfig {
    /// Load from an optional JSON file, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, |key| std::env::var(key).ok())
    }

    /// Like [`load`](Self::load) with an explicit environment lookup.
    pub fn load_with_env<F>(path: Option<&Path>, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|e| {
                    LocatorError::Config(format!("cannot read {}: {e}", path.display()))
                })?;
                let config: Self = serde_json::from_str(&raw).map_err(|e| {
                    LocatorError::Config(format!("invalid config {}: {e}", path.display()))
                })?;
                info!(path = %path.display(), "Loaded configuration");
                config
            }
            None => Self::default(),
        };

        config.apply_env(env);
        config.validate()?;
        Ok(config)
    }

    fn apply_env<F>(&mut self, env: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = env(ENV_TEMPLATE_PATH).filter(|v| !v.is_empty()) {
            debug!(%value, "Template path from environment");
            self.default_template = Some(PathBuf::from(value));
        }
        if let Some(value) = env(ENV_PROFILES_PATH).filter(|v| !v.is_empty()) {
            debug!(%value, "Profiles path from environment");
            self.profiles_path = Some(PathBuf::from(value));
        }
    }

    /// Reject settings the detectors cannot run with.
    pub fn validate(&self) -> Result<()> {
        let orb = &self.detection.orb;
        if !(orb.scale_factor > 1.0) {
            return Err(LocatorError::Config(format!(
                "orb.scale_factor must be greater than 1, got {}",
                orb.scale_factor
            )));
        }
        if orb.n_levels == 0 || orb.n_features == 0 {
            return Err(LocatorError::Config(
                "orb.n_levels and orb.n_features must be positive".into(),
            ));
        }
        if orb.patch_size < MIN_PATCH_SIZE {
            return Err(LocatorError::Config(format!(
                "orb.patch_size must be at least {MIN_PATCH_SIZE}, got {}",
                orb.patch_size
            )));
        }
        let ransac = &self.detection.ransac;
        if !(ransac.confidence > 0.0 && ransac.confidence < 1.0) {
            return Err(LocatorError::Config(format!(
                "ransac.confidence must lie in (0, 1), got {}",
                ransac.confidence
            )));
        }
        if self
            .detection
            .template
            .scales
            .iter()
            .any(|s| !(s.is_finite() && *s > 0.0))
        {
            return Err(LocatorError::Config(
                "template.scales must be positive finite numbers".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn default_scales_span_point_four_to_two() {
        let scales = TemplateConfig::default_scales();
        assert_eq!(scales.len(), 33);
        assert_eq!(scales[0], 0.4);
        assert_eq!(scales[1], 0.45);
        assert_eq!(scales[12], 1.0);
        assert_eq!(scales[32], 2.0);
    }

    #[test]
    fn defaults_without_file_or_env() {
        let config = LocatorConfig::load_with_env(None, no_env).unwrap();
        assert_eq!(config, LocatorConfig::default());
        assert_eq!(config.detection.orb.n_features, 2000);
        assert_eq!(config.annotation.bbox_thickness, 4);
        assert!(config.detection.ransac.seed.is_none());
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"default_template": "/srv/logo.png", "detection": {{"ransac": {{"seed": 7}}}}}}"#
        )
        .unwrap();

        let config = LocatorConfig::load_with_env(Some(file.path()), no_env).unwrap();
        assert_eq!(config.default_template, Some(PathBuf::from("/srv/logo.png")));
        assert_eq!(config.detection.ransac.seed, Some(7));
        assert_eq!(config.detection.ransac.reproj_threshold, 5.0);
        assert_eq!(config.detection.template.scales.len(), 33);
    }

    #[test]
    fn environment_overrides_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"profiles_path": "/etc/profiles.json"}}"#).unwrap();

        let config = LocatorConfig::load_with_env(Some(file.path()), |key| match key {
            ENV_PROFILES_PATH => Some("/tmp/p.json".to_string()),
            ENV_TEMPLATE_PATH => Some(String::new()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.profiles_path, Some(PathBuf::from("/tmp/p.json")));
        assert_eq!(config.default_template, None);
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let err = LocatorConfig::load_with_env(Some(file.path()), no_env).unwrap_err();
        assert!(matches!(err, LocatorError::Config(_)));
    }

    #[test]
    fn tiny_patch_size_is_rejected() {
        let mut config = LocatorConfig::default();
        config.detection.orb.patch_size = 0;
        config.detection.orb.edge_threshold = 0;
        assert!(matches!(config.validate(), Err(LocatorError::Config(_))));

        config.detection.orb.patch_size = MIN_PATCH_SIZE;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn invalid_scale_factor_is_rejected() {
        let mut config = LocatorConfig::default();
        config.detection.orb.scale_factor = 1.0;
        assert!(config.validate().is_err());
    }
}
