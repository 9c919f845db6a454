// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// logoloc-detect: find a known logo on a scanned page.
//
// Two detectors: ORB keypoints matched with a ratio test and verified by a
// RANSAC homography (perspective-tolerant, needs texture), and multi-scale
// correlation of Canny edge maps (works on small or flat logos). `Locator`
// chooses between them. `ScanImage` handles decode, crop, annotate, encode.

pub mod feature;
pub mod locate;
pub mod raster;
pub mod template;

#[cfg(test)]
mod test_support;

// Re-export the entry points so callers can use `logoloc_detect::Locator` etc.
pub use feature::FeatureDetector;
pub use locate::{Locator, detect_logo};
pub use raster::{LOGO_COLOR, SECTION_COLOR, ScanImage};
pub use template::TemplateDetector;
