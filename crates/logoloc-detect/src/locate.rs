// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Detector selection: feature matching, template matching, or feature
// matching with template fallback.

use image::GrayImage;
use logoloc_core::config::DetectionConfig;
use logoloc_core::{DetectionResult, MethodChoice};
use tracing::{debug, info, instrument};

use crate::feature::FeatureDetector;
use crate::raster::ScanImage;
use crate::template::TemplateDetector;

/// Both detectors, built once from a [`DetectionConfig`] and shared across
/// pages. Holds no per-call state.
pub struct Locator {
    feature: FeatureDetector,
    template: TemplateDetector,
}

impl Default for Locator {
    fn default() -> Self {
        Self::new(&DetectionConfig::default())
    }
}

impl Locator {
    pub fn new(config: &DetectionConfig) -> Self {
        Self {
            feature: FeatureDetector::new(config),
            template: TemplateDetector::new(&config.template),
        }
    }

    /// Locate `template` in `image` with the requested method.
    ///
    /// `Auto` runs the feature detector and falls back to the template
    /// detector only when the first finds nothing.
    #[instrument(skip_all, fields(method = %method))]
    pub fn locate(
        &self,
        image: &GrayImage,
        template: &GrayImage,
        method: MethodChoice,
    ) -> Option<DetectionResult> {
        let result = match method {
            MethodChoice::Orb => self.feature.detect(image, template),
            MethodChoice::Template => self.template.detect(image, template),
            MethodChoice::Auto => self.feature.detect(image, template).or_else(|| {
                debug!("Feature match failed; falling back to template match");
                self.template.detect(image, template)
            }),
        };

        match &result {
            Some(found) => info!(
                method = %found.method,
                confidence = found.confidence,
                bbox = %found.bbox,
                "Logo located"
            ),
            None => info!("Logo not found"),
        }
        result
    }

    /// [`locate`](Self::locate) on decoded pages.
    pub fn detect_logo(
        &self,
        image: &ScanImage,
        template: &ScanImage,
        method: MethodChoice,
    ) -> Option<DetectionResult> {
        self.locate(&image.to_gray(), &template.to_gray(), method)
    }
}

/// One-shot detection with the default configuration.
pub fn detect_logo(
    image: &ScanImage,
    template: &ScanImage,
    method: MethodChoice,
) -> Option<DetectionResult> {
    Locator::default().detect_logo(image, template, method)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{framed_logo, paste, textured_logo, white_canvas};
    use image::DynamicImage;
    use logoloc_core::geometry::relative_rect;
    use logoloc_core::{BoundingBox, DetectionMethod};

    fn seeded() -> Locator {
        let mut config = DetectionConfig::default();
        config.ransac.seed = Some(3);
        Locator::new(&config)
    }

    fn small_logo_page() -> (GrayImage, GrayImage) {
        let logo = framed_logo(100, 50, 8);
        let mut page = white_canvas(800, 600);
        paste(&mut page, &logo, 300, 200);
        (page, logo)
    }

    #[test]
    fn auto_falls_back_to_template_for_small_logo() {
        let (page, logo) = small_logo_page();
        let result = seeded()
            .locate(&page, &logo, MethodChoice::Auto)
            .expect("fallback should locate the logo");
        assert_eq!(result.method, DetectionMethod::Template);
        assert_eq!(result.bbox, BoundingBox::new(300, 200, 100, 50));
    }

    #[test]
    fn auto_still_answers_for_solid_logo() {
        let logo = GrayImage::from_pixel(100, 50, image::Luma([0u8]));
        let mut page = white_canvas(800, 600);
        paste(&mut page, &logo, 300, 200);

        let result = seeded()
            .locate(&page, &logo, MethodChoice::Auto)
            .expect("solid logo falls through to template match");
        assert_eq!(result.method, DetectionMethod::Template);
        // A flat edge map saturates the score; the first scale (0.4) wins.
        assert_eq!(result.bbox, BoundingBox::new(0, 0, 40, 20));
        assert_eq!(result.confidence, 1.0);
    }

    #[test]
    fn section_below_located_logo() {
        let (page, logo) = small_logo_page();
        let shape = logoloc_core::ImageShape::new(page.width(), page.height());
        let logo_box = seeded()
            .locate(&page, &logo, MethodChoice::Auto)
            .expect("logo")
            .bbox;
        let section = relative_rect(shape, logo_box, 0.0, 1.0, 1.0, 3.0).unwrap();
        assert_eq!(section, BoundingBox::new(300, 250, 200, 150));
    }

    #[test]
    fn orb_only_does_not_fall_back() {
        let (page, logo) = small_logo_page();
        assert!(seeded().locate(&page, &logo, MethodChoice::Orb).is_none());
    }

    #[test]
    fn auto_prefers_feature_match_when_it_succeeds() {
        let logo = textured_logo(240, 160, 12);
        let mut page = white_canvas(800, 600);
        paste(&mut page, &logo, 120, 260);
        let result = seeded().locate(&page, &logo, MethodChoice::Auto).unwrap();
        assert_eq!(result.method, DetectionMethod::Orb);
    }

    #[test]
    fn template_method_skips_feature_match() {
        let logo = textured_logo(240, 160, 12);
        let mut page = white_canvas(800, 600);
        paste(&mut page, &logo, 120, 260);
        let result = seeded()
            .locate(&page, &logo, MethodChoice::Template)
            .unwrap();
        assert_eq!(result.method, DetectionMethod::Template);
        let b = result.bbox;
        assert!((b.x - 120).abs() <= 2 && (b.y - 260).abs() <= 2, "bbox {b}");
    }

    #[test]
    fn free_function_accepts_colour_pages() {
        let (page, logo) = small_logo_page();
        let page = ScanImage::from(DynamicImage::ImageRgb8(
            DynamicImage::ImageLuma8(page).to_rgb8(),
        ));
        let logo = ScanImage::from(DynamicImage::ImageLuma8(logo));
        let result = detect_logo(&page, &logo, MethodChoice::Template).unwrap();
        assert_eq!(result.bbox, BoundingBox::new(300, 200, 100, 50));
    }
}
