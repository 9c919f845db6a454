// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Multi-scale edge-template detector.
//
// Both images are reduced to Canny edge maps. The template edge map is
// resized over a list of scales and correlated against the image edge map at
// each one; the highest-scoring placement over all scales wins.

pub mod correlate;

use image::GrayImage;
use image::imageops::{self, FilterType};
use imageproc::edges::canny;
use logoloc_core::config::TemplateConfig;
use logoloc_core::geometry::clamp;
use logoloc_core::{DetectionMethod, DetectionResult, ImageShape};
use rayon::prelude::*;
use tracing::{debug, instrument};

use self::correlate::{IntegralTables, SparseRows, best_match};

/// Score every candidate must beat; correlation never goes below -1.
const INITIAL_BEST: f64 = -1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Candidate {
    scale: f64,
    x: usize,
    y: usize,
    width: u32,
    height: u32,
    score: f64,
}

/// Edge-map template matcher for logos with little corner texture.
pub struct TemplateDetector {
    config: TemplateConfig,
}

impl TemplateDetector {
    pub fn new(config: &TemplateConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Find `template` in `image` over the configured scales.
    ///
    /// `None` only when no scale produced a placement. The confidence is the
    /// raw correlation score and is not clipped.
    #[instrument(skip_all, fields(
        image = %format!("{}x{}", image.width(), image.height()),
        template = %format!("{}x{}", template.width(), template.height()),
        scales = self.config.scales.len(),
    ))]
    pub fn detect(&self, image: &GrayImage, template: &GrayImage) -> Option<DetectionResult> {
        let shape = ImageShape::new(image.width(), image.height())
            .ensure_non_empty()
            .ok()?;
        if template.width() == 0 || template.height() == 0 {
            return None;
        }

        let (low, high) = (self.config.canny_low, self.config.canny_high);
        let image_edges = canny(image, low, high);
        let template_edges = canny(template, low, high);
        let image_rows = SparseRows::from_gray(&image_edges);
        let tables = IntegralTables::new(&image_edges);
        debug!(
            image_edges = image_rows.nnz(),
            "Edge maps computed"
        );

        let per_scale: Vec<Option<Candidate>> = self
            .config
            .scales
            .par_iter()
            .map(|&scale| self.try_scale(scale, shape, &image_rows, &tables, &template_edges))
            .collect();

        // Scale order decides ties: a later scale must score strictly higher.
        let mut best_score = INITIAL_BEST;
        let mut best: Option<Candidate> = None;
        for candidate in per_scale.into_iter().flatten() {
            if candidate.score > best_score {
                best_score = candidate.score;
                best = Some(candidate);
            }
        }
        let best = best?;

        let bbox = clamp(
            best.x as i64,
            best.y as i64,
            i64::from(best.width),
            i64::from(best.height),
            shape,
        );
        debug!(scale = best.scale, score = best.score, %bbox, "Best template placement");

        Some(DetectionResult {
            method: DetectionMethod::Template,
            confidence: best.score as f32,
            bbox,
            polygon: bbox.corners(),
        })
    }

    fn try_scale(
        &self,
        scale: f64,
        shape: ImageShape,
        image_rows: &SparseRows,
        tables: &IntegralTables,
        template_edges: &GrayImage,
    ) -> Option<Candidate> {
        let width = scaled_len(template_edges.width(), scale);
        let height = scaled_len(template_edges.height(), scale);
        let min_side = self.config.min_template_side;
        if height >= shape.height || width >= shape.width || height < min_side || width < min_side {
            return None;
        }

        let scaled = resize_area(template_edges, width, height, scale);
        let peak = best_match(image_rows, tables, &SparseRows::from_gray(&scaled))?;
        Some(Candidate {
            scale,
            x: peak.x,
            y: peak.y,
            width,
            height,
            score: peak.score,
        })
    }
}

/// `round(len * scale)`, ties to even.
fn scaled_len(len: u32, scale: f64) -> u32 {
    (f64::from(len) * scale).round_ties_even().max(0.0) as u32
}

/// Pixel-area resampling for shrinking; bilinear for enlarging.
fn resize_area(src: &GrayImage, width: u32, height: u32, scale: f64) -> GrayImage {
    if (width, height) == src.dimensions() {
        return src.clone();
    }
    if scale > 1.0 {
        return imageops::resize(src, width, height, FilterType::Triangle);
    }

    let inv = 1.0 / scale;
    let (sw, sh) = (src.width() as usize, src.height() as usize);
    let (dw, dh) = (width as usize, height as usize);
    let x_weights = area_weights(sw, dw, inv);
    let y_weights = area_weights(sh, dh, inv);

    // Horizontal pass: sh rows of dw samples.
    let mut horizontal = vec![0.0f64; sh * dw];
    for y in 0..sh {
        for (dx, weights) in x_weights.iter().enumerate() {
            horizontal[y * dw + dx] = weights
                .iter()
                .map(|&(sx, w)| w * f64::from(src.get_pixel(sx as u32, y as u32).0[0]))
                .sum();
        }
    }

    GrayImage::from_fn(width, height, |dx, dy| {
        let v: f64 = y_weights[dy as usize]
            .iter()
            .map(|&(sy, w)| w * horizontal[sy * dw + dx as usize])
            .sum();
        image::Luma([v.round_ties_even().clamp(0.0, 255.0) as u8])
    })
}

/// Source indices and weights for each destination cell of width `inv`
/// source pixels. Each weight list sums to 1.
fn area_weights(src_len: usize, dst_len: usize, inv: f64) -> Vec<Vec<(usize, f64)>> {
    let last = src_len.saturating_sub(1);
    (0..dst_len)
        .map(|d| {
            let start = d as f64 * inv;
            let end = start + inv;
            let cell = inv.min(src_len as f64 - start);
            let whole_end = (end.floor() as usize).min(last);
            let whole_start = (start.ceil() as usize).min(whole_end);

            let mut weights = Vec::new();
            if whole_start as f64 - start > 1e-3 {
                weights.push((whole_start - 1, (whole_start as f64 - start) / cell));
            }
            for s in whole_start..whole_end {
                weights.push((s, 1.0 / cell));
            }
            if end - whole_end as f64 > 1e-3 {
                weights.push((whole_end, (end - whole_end as f64).min(1.0).min(cell) / cell));
            }
            weights
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{framed_logo, paste, white_canvas};
    use logoloc_core::BoundingBox;

    fn detector() -> TemplateDetector {
        TemplateDetector::new(&TemplateConfig::default())
    }

    #[test]
    fn area_weights_for_halving() {
        let weights = area_weights(10, 5, 2.0);
        assert_eq!(weights.len(), 5);
        assert_eq!(weights[0], vec![(0, 0.5), (1, 0.5)]);
        assert_eq!(weights[4], vec![(8, 0.5), (9, 0.5)]);
    }

    #[test]
    fn area_weights_for_fractional_cells() {
        let weights = area_weights(5, 2, 2.5);
        for cell in &weights {
            let total: f64 = cell.iter().map(|&(_, w)| w).sum();
            assert!((total - 1.0).abs() < 1e-9, "{cell:?}");
        }
        assert_eq!(weights[0].iter().map(|&(s, _)| s).collect::<Vec<_>>(), [0, 1, 2]);
        assert_eq!(weights[1].iter().map(|&(s, _)| s).collect::<Vec<_>>(), [2, 3, 4]);
    }

    #[test]
    fn halving_averages_pairs() {
        let src = GrayImage::from_fn(4, 2, |x, _| image::Luma([if x % 2 == 0 { 255 } else { 0 }]));
        let out = resize_area(&src, 2, 1, 0.5);
        assert_eq!(out.dimensions(), (2, 1));
        // (255 + 0 + 255 + 0) / 4 = 127.5, rounded half to even.
        assert_eq!(out.get_pixel(0, 0).0[0], 128);
    }

    #[test]
    fn scaled_len_rounds_half_to_even() {
        assert_eq!(scaled_len(5, 0.5), 2);
        assert_eq!(scaled_len(7, 0.5), 4);
        assert_eq!(scaled_len(100, 1.0), 100);
    }

    #[test]
    fn pasted_logo_is_found_exactly() {
        let logo = framed_logo(100, 50, 21);
        let mut page = white_canvas(800, 600);
        paste(&mut page, &logo, 300, 200);

        let result = detector().detect(&page, &logo).expect("template match");
        assert_eq!(result.method, DetectionMethod::Template);
        assert_eq!(result.bbox, BoundingBox::new(300, 200, 100, 50));
        assert_eq!(result.polygon, result.bbox.corners());
        assert!(result.confidence > 0.99, "confidence {}", result.confidence);
    }

    #[test]
    fn enlarged_logo_is_found_near_its_scale() {
        let logo = framed_logo(120, 60, 4);
        let enlarged = imageops::resize(&logo, 180, 90, FilterType::Nearest);
        let mut page = white_canvas(800, 600);
        paste(&mut page, &enlarged, 250, 300);

        let result = detector().detect(&page, &logo).expect("template match");
        let b = result.bbox;
        assert!((b.x - 250).abs() <= 4 && (b.y - 300).abs() <= 4, "bbox {b}");
        assert!((b.w - 180).abs() <= 12, "bbox {b}");
    }

    #[test]
    fn template_larger_than_every_scale_allows_is_not_found() {
        let logo = framed_logo(400, 300, 1);
        assert!(detector().detect(&white_canvas(150, 110), &logo).is_none());
    }

    #[test]
    fn edgeless_template_takes_first_scale_at_origin() {
        let logo = white_canvas(60, 40);
        let mut page = white_canvas(300, 200);
        paste(&mut page, &framed_logo(60, 40, 2), 10, 10);
        let result = detector().detect(&page, &logo).expect("flat template placement");
        // 0.4 is the first scale; 60x40 becomes 24x16.
        assert_eq!(result.bbox, BoundingBox::new(0, 0, 24, 16));
        assert_eq!(result.confidence, 1.0);
    }

    #[test]
    fn blank_page_scores_zero_at_origin() {
        let logo = framed_logo(60, 40, 2);
        let result = detector().detect(&white_canvas(300, 200), &logo).unwrap();
        assert_eq!((result.bbox.x, result.bbox.y), (0, 0));
        assert_eq!(result.confidence, 0.0);
    }
}
