// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Oriented FAST keypoints with rotated BRIEF descriptors.
//
// Pipeline per pyramid level:
//   1. FAST-9 corners, 3x3 non-maximum suppression, border filter
//   2. Keep the strongest 2N by FAST score, then the best N by Harris response
//   3. Orientation from the intensity centroid of a circular patch
//   4. 256-bit descriptor sampled from a Gaussian-smoothed copy of the level
//
// Levels are processed in parallel; keypoints are reported in level-0 pixels.

use image::GrayImage;
use image::imageops::{self, FilterType};
use imageproc::corners::{Corner, corners_fast9};
use imageproc::filter::gaussian_blur_f32;
use imageproc::gradients::{horizontal_sobel, vertical_sobel};
use logoloc_core::config::OrbConfig;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::{debug, instrument};

/// Packed 256-bit binary descriptor.
pub type Descriptor = [u64; 4];

/// Number of intensity comparisons per descriptor.
pub const DESCRIPTOR_BITS: usize = 256;

const PATTERN_SEED: u64 = 0x3498_5739;
const HARRIS_BLOCK: i32 = 7;
const HARRIS_K: f64 = 0.04;
const DESCRIPTOR_SIGMA: f32 = 2.0;

/// A detected keypoint in level-0 image coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    /// Orientation in radians, `atan2(m01, m10)`.
    pub angle: f32,
    /// Harris corner response at the detection level.
    pub response: f32,
}

/// Keypoints and their descriptors, index-aligned.
#[derive(Debug, Clone, Default)]
pub struct Features {
    pub keypoints: Vec<Keypoint>,
    pub descriptors: Vec<Descriptor>,
}

impl Features {
    pub fn len(&self) -> usize {
        self.keypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keypoints.is_empty()
    }
}

struct Level {
    index: usize,
    scale: f32,
    image: GrayImage,
}

type PointPair = [(i32, i32); 2];

/// Reusable keypoint extractor. Construction builds the sampling pattern
/// once; `extract` is pure and may be called from several threads.
pub struct OrbExtractor {
    config: OrbConfig,
    border: u32,
    half_patch: i32,
    /// Half-width of the circular patch for each row offset.
    umax: Vec<i32>,
    pattern: Vec<PointPair>,
}

impl OrbExtractor {
    pub fn new(config: &OrbConfig) -> Self {
        let half_patch = (config.patch_size / 2).max(1) as i32;
        // Wide enough for the orientation patch and the Harris window.
        let border = config
            .edge_threshold
            .max(half_patch as u32 + 1)
            .max((HARRIS_BLOCK / 2 + 1) as u32);
        let umax = (0..=half_patch)
            .map(|dy| f64::from(half_patch * half_patch - dy * dy).sqrt() as i32)
            .collect();

        Self {
            config: config.clone(),
            border,
            half_patch,
            umax,
            pattern: sampling_pattern((half_patch - 2).max(1)),
        }
    }

    /// Detect keypoints and compute descriptors over the whole pyramid.
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn extract(&self, image: &GrayImage) -> Features {
        let levels = self.build_pyramid(image);
        let quotas = self.level_quotas();

        let per_level: Vec<Vec<(Keypoint, Descriptor)>> = levels
            .par_iter()
            .map(|level| {
                let quota = quotas.get(level.index).copied().unwrap_or(0);
                self.detect_level(level, quota)
            })
            .collect();

        let (keypoints, descriptors): (Vec<_>, Vec<_>) = per_level.into_iter().flatten().unzip();
        debug!(
            levels = levels.len(),
            keypoints = keypoints.len(),
            "Features extracted"
        );
        Features {
            keypoints,
            descriptors,
        }
    }

    /// Levels too small to hold a keypoint away from the border are dropped,
    /// along with every coarser level.
    fn build_pyramid(&self, image: &GrayImage) -> Vec<Level> {
        let min_side = 2 * self.border + 1;
        let mut levels = Vec::with_capacity(self.config.n_levels);

        for index in 0..self.config.n_levels {
            let scale = self.config.scale_factor.powi(index as i32);
            let width = (image.width() as f32 / scale).round() as u32;
            let height = (image.height() as f32 / scale).round() as u32;
            if width < min_side || height < min_side {
                break;
            }

            let resized = if index == 0 {
                image.clone()
            } else {
                imageops::resize(image, width, height, FilterType::Triangle)
            };
            levels.push(Level {
                index,
                scale,
                image: resized,
            });
        }

        levels
    }

    /// Split `n_features` over the levels as a geometric series in
    /// `1 / scale_factor`; the last level takes the remainder.
    fn level_quotas(&self) -> Vec<usize> {
        let n_levels = self.config.n_levels;
        let n_features = self.config.n_features;
        if n_levels == 0 {
            return Vec::new();
        }

        let factor = 1.0 / f64::from(self.config.scale_factor);
        let mut per_level =
            n_features as f64 * (1.0 - factor) / (1.0 - factor.powi(n_levels as i32));
        let mut quotas = Vec::with_capacity(n_levels);
        let mut assigned = 0usize;

        for _ in 0..n_levels - 1 {
            let quota = (per_level.round() as usize).min(n_features - assigned);
            quotas.push(quota);
            assigned += quota;
            per_level *= factor;
        }
        quotas.push(n_features - assigned);
        quotas
    }

    fn detect_level(&self, level: &Level, quota: usize) -> Vec<(Keypoint, Descriptor)> {
        if quota == 0 {
            return Vec::new();
        }

        let image = &level.image;
        let corners = corners_fast9(image, self.config.fast_threshold);
        let mut candidates = self.suppress_and_filter(image, corners);

        candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
        candidates.truncate(2 * quota);

        let gx = horizontal_sobel(image);
        let gy = vertical_sobel(image);
        let mut ranked: Vec<(Corner, f32)> = candidates
            .into_iter()
            .map(|c| {
                let response = harris_response(&gx, &gy, c.x, c.y);
                (c, response)
            })
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.truncate(quota);

        let smoothed = gaussian_blur_f32(image, DESCRIPTOR_SIGMA);

        ranked
            .into_iter()
            .map(|(corner, response)| {
                let angle = self.orientation(image, corner.x, corner.y);
                let descriptor = self.describe(&smoothed, corner.x, corner.y, angle);
                let keypoint = Keypoint {
                    x: corner.x as f32 * level.scale,
                    y: corner.y as f32 * level.scale,
                    angle,
                    response,
                };
                (keypoint, descriptor)
            })
            .collect()
    }

    /// 3x3 non-maximum suppression on FAST score, then drop corners inside
    /// the border band.
    fn suppress_and_filter(&self, image: &GrayImage, corners: Vec<Corner>) -> Vec<Corner> {
        let (w, h) = image.dimensions();
        let (wu, hu) = (w as usize, h as usize);
        let mut scores = vec![0.0f32; wu * hu];
        for c in &corners {
            scores[c.y as usize * wu + c.x as usize] = c.score;
        }

        let border = self.border;
        corners
            .into_iter()
            .filter(|c| c.x >= border && c.y >= border && c.x < w - border && c.y < h - border)
            .filter(|c| {
                let (x, y) = (c.x as usize, c.y as usize);
                (y - 1..=y + 1).all(|ny| {
                    (x - 1..=x + 1).all(|nx| scores[ny * wu + nx] <= c.score)
                })
            })
            .collect()
    }

    /// Intensity-centroid angle over the circular patch.
    fn orientation(&self, image: &GrayImage, x: u32, y: u32) -> f32 {
        let r = self.half_patch;
        let (cx, cy) = (x as i32, y as i32);
        let mut m01 = 0i64;
        let mut m10 = 0i64;

        for dy in -r..=r {
            let span = self.umax[dy.unsigned_abs() as usize];
            for dx in -span..=span {
                let v = i64::from(image.get_pixel((cx + dx) as u32, (cy + dy) as u32).0[0]);
                m10 += i64::from(dx) * v;
                m01 += i64::from(dy) * v;
            }
        }

        (m01 as f32).atan2(m10 as f32)
    }

    fn describe(&self, smoothed: &GrayImage, x: u32, y: u32, angle: f32) -> Descriptor {
        let (sin, cos) = angle.sin_cos();
        let max_x = smoothed.width() as i32 - 1;
        let max_y = smoothed.height() as i32 - 1;
        let sample = |(px, py): (i32, i32)| -> u8 {
            let rx = (cos * px as f32 - sin * py as f32).round() as i32;
            let ry = (sin * px as f32 + cos * py as f32).round() as i32;
            let sx = (x as i32 + rx).clamp(0, max_x) as u32;
            let sy = (y as i32 + ry).clamp(0, max_y) as u32;
            smoothed.get_pixel(sx, sy).0[0]
        };

        let mut descriptor = [0u64; 4];
        for (bit, [p, q]) in self.pattern.iter().enumerate() {
            if sample(*p) < sample(*q) {
                descriptor[bit / 64] |= 1u64 << (bit % 64);
            }
        }
        descriptor
    }
}

/// Harris response `det(M) - k * trace(M)^2` over a 7x7 block.
fn harris_response(
    gx: &image::ImageBuffer<image::Luma<i16>, Vec<i16>>,
    gy: &image::ImageBuffer<image::Luma<i16>, Vec<i16>>,
    x: u32,
    y: u32,
) -> f32 {
    let r = HARRIS_BLOCK / 2;
    let (mut sxx, mut syy, mut sxy) = (0.0f64, 0.0f64, 0.0f64);

    for dy in -r..=r {
        for dx in -r..=r {
            let px = (x as i32 + dx) as u32;
            let py = (y as i32 + dy) as u32;
            let ix = f64::from(gx.get_pixel(px, py).0[0]);
            let iy = f64::from(gy.get_pixel(px, py).0[0]);
            sxx += ix * ix;
            syy += iy * iy;
            sxy += ix * iy;
        }
    }

    let trace = sxx + syy;
    (sxx * syy - sxy * sxy - HARRIS_K * trace * trace) as f32
}

/// Fixed comparison pattern: point pairs drawn uniformly from a disk.
fn sampling_pattern(radius: i32) -> Vec<PointPair> {
    let mut rng = StdRng::seed_from_u64(PATTERN_SEED);
    (0..DESCRIPTOR_BITS)
        .map(|_| loop {
            let p = disk_point(&mut rng, radius);
            let q = disk_point(&mut rng, radius);
            if p != q {
                break [p, q];
            }
        })
        .collect()
}

fn disk_point(rng: &mut StdRng, radius: i32) -> (i32, i32) {
    loop {
        let x = rng.gen_range(-radius..=radius);
        let y = rng.gen_range(-radius..=radius);
        if x * x + y * y <= radius * radius {
            return (x, y);
        }
    }
}

// -- Tests --------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{textured_logo, white_canvas};

    fn extractor() -> OrbExtractor {
        OrbExtractor::new(&OrbConfig::default())
    }

    #[test]
    fn quotas_sum_to_feature_budget() {
        let quotas = extractor().level_quotas();
        assert_eq!(quotas.len(), 8);
        assert_eq!(quotas.iter().sum::<usize>(), 2000);
        assert!(quotas.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn pattern_is_deterministic_and_inside_patch() {
        let a = sampling_pattern(13);
        let b = sampling_pattern(13);
        assert_eq!(a, b);
        assert_eq!(a.len(), DESCRIPTOR_BITS);
        for [p, q] in a {
            assert!(p.0 * p.0 + p.1 * p.1 <= 169);
            assert!(q.0 * q.0 + q.1 * q.1 <= 169);
        }
    }

    #[test]
    fn blank_image_has_no_features() {
        assert!(extractor().extract(&white_canvas(200, 200)).is_empty());
    }

    #[test]
    fn image_smaller_than_border_band_has_no_features() {
        // 50 rows cannot hold a keypoint 31 px away from both edges.
        assert!(extractor().extract(&textured_logo(100, 50, 3)).is_empty());
    }

    #[test]
    fn textured_image_yields_keypoints_inside_bounds() {
        let image = textured_logo(240, 160, 7);
        let features = extractor().extract(&image);

        assert!(features.len() >= 50, "only {} keypoints", features.len());
        assert_eq!(features.keypoints.len(), features.descriptors.len());
        for kp in &features.keypoints {
            assert!(kp.x >= 0.0 && kp.x < 240.0 && kp.y >= 0.0 && kp.y < 160.0);
            assert!(kp.angle.is_finite());
        }
    }

    #[test]
    fn tiny_patch_keeps_harris_window_inside_level() {
        let config = OrbConfig {
            patch_size: 0,
            edge_threshold: 0,
            ..OrbConfig::default()
        };
        let orb = OrbExtractor::new(&config);
        assert_eq!(orb.border, (HARRIS_BLOCK / 2 + 1) as u32);

        let features = orb.extract(&textured_logo(120, 80, 5));
        for kp in &features.keypoints {
            assert!(kp.x >= 4.0 && kp.y >= 4.0, "keypoint at ({}, {})", kp.x, kp.y);
        }
    }

    #[test]
    fn extraction_is_deterministic() {
        let image = textured_logo(240, 160, 11);
        let a = extractor().extract(&image);
        let b = extractor().extract(&image);
        assert_eq!(a.keypoints, b.keypoints);
        assert_eq!(a.descriptors, b.descriptors);
    }
}
