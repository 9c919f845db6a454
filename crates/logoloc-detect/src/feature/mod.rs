// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Feature-match detector: keypoints, ratio-tested matches, RANSAC homography.

pub mod homography;
pub mod matcher;
pub mod orb;

use image::GrayImage;
use logoloc_core::config::DetectionConfig;
use logoloc_core::geometry::clamp;
use logoloc_core::{DetectionMethod, DetectionResult, ImageShape, Point, Polygon};
use tracing::{debug, instrument};

use self::homography::{fit_homography_ransac, project};
use self::matcher::ratio_matches;
use self::orb::OrbExtractor;

/// Minimum keypoints either image must yield before matching is attempted.
const MIN_KEYPOINTS: usize = 4;

/// Locates a planar logo under perspective by matching binary features.
pub struct FeatureDetector {
    extractor: OrbExtractor,
    config: DetectionConfig,
}

impl FeatureDetector {
    pub fn new(config: &DetectionConfig) -> Self {
        Self {
            extractor: OrbExtractor::new(&config.orb),
            config: config.clone(),
        }
    }

    /// Find `template` in `image`. Every failure along the way (too few
    /// keypoints, too few good matches, no homography, a projection at
    /// infinity) is reported as `None`.
    #[instrument(skip_all, fields(
        image = %format!("{}x{}", image.width(), image.height()),
        template = %format!("{}x{}", template.width(), template.height()),
    ))]
    pub fn detect(&self, image: &GrayImage, template: &GrayImage) -> Option<DetectionResult> {
        let shape = ImageShape::new(image.width(), image.height())
            .ensure_non_empty()
            .ok()?;

        let tmpl = self.extractor.extract(template);
        let scene = self.extractor.extract(image);
        debug!(
            template_keypoints = tmpl.len(),
            image_keypoints = scene.len(),
            "Keypoints detected"
        );
        if tmpl.len() < MIN_KEYPOINTS || scene.len() < MIN_KEYPOINTS {
            return None;
        }

        let good = ratio_matches(
            &tmpl.descriptors,
            &scene.descriptors,
            self.config.matching.ratio,
        );
        debug!(good_matches = good.len(), "Descriptors matched");
        if good.len() < self.config.matching.min_good_matches {
            return None;
        }

        let src: Vec<[f64; 2]> = good
            .iter()
            .map(|m| {
                let kp = &tmpl.keypoints[m.query];
                [f64::from(kp.x), f64::from(kp.y)]
            })
            .collect();
        let dst: Vec<[f64; 2]> = good
            .iter()
            .map(|m| {
                let kp = &scene.keypoints[m.train];
                [f64::from(kp.x), f64::from(kp.y)]
            })
            .collect();

        let fit = match fit_homography_ransac(&src, &dst, &self.config.ransac) {
            Ok(fit) => fit,
            Err(err) => {
                debug!(%err, "No homography");
                return None;
            }
        };

        let (tw, th) = (f64::from(template.width()), f64::from(template.height()));
        let projected = [(0.0, 0.0), (tw, 0.0), (tw, th), (0.0, th)].map(|(x, y)| project(&fit.h, x, y));
        if projected.iter().flatten().any(|v| !v.is_finite()) {
            debug!("Template corner projected to infinity");
            return None;
        }

        // Truncation toward zero, matching integer conversion of the corners.
        let corners = projected.map(|[x, y]| Point::new(x as i32, y as i32));
        let x_min = corners.iter().map(|p| p.x).min().unwrap_or(0);
        let x_max = corners.iter().map(|p| p.x).max().unwrap_or(0);
        let y_min = corners.iter().map(|p| p.y).min().unwrap_or(0);
        let y_max = corners.iter().map(|p| p.y).max().unwrap_or(0);
        let bbox = clamp(
            i64::from(x_min),
            i64::from(y_min),
            i64::from(x_max) - i64::from(x_min),
            i64::from(y_max) - i64::from(y_min),
            shape,
        );

        let confidence = (fit.n_inliers as f32 / fit.inlier_mask.len() as f32).clamp(0.0, 1.0);
        debug!(inliers = fit.n_inliers, total = good.len(), %bbox, "Homography accepted");

        Some(DetectionResult {
            method: DetectionMethod::Orb,
            confidence,
            bbox,
            polygon: Polygon(corners),
        })
    }
}
