// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// On-disk fixtures for the command tests.

use std::path::{Path, PathBuf};

use image::{GrayImage, Luma, imageops};

/// 100x50 logo: black and white 5 px blocks inside a 10 px white margin.
pub fn logo() -> GrayImage {
    GrayImage::from_fn(100, 50, |x, y| {
        let inside = (10..90).contains(&x) && (10..40).contains(&y);
        let block = ((x / 5) * 7 + (y / 5) * 3) % 4 == 0;
        Luma([if inside && block { 0 } else { 255 }])
    })
}

/// Writes `logo.png` and a `scans/` directory holding `form.png` (logo at
/// (300, 200) on a 500x400 page), `blank.png`, and an undecodable
/// `broken.png`. Returns (template, scans).
pub fn write_fixture(dir: &Path) -> (PathBuf, PathBuf) {
    let logo = logo();
    let mut page = GrayImage::from_pixel(500, 400, Luma([255u8]));
    imageops::replace(&mut page, &logo, 300, 200);

    let template = dir.join("logo.png");
    let scans = dir.join("scans");
    std::fs::create_dir_all(&scans).unwrap();
    logo.save(&template).unwrap();
    page.save(scans.join("form.png")).unwrap();
    GrayImage::from_pixel(500, 400, Luma([255u8]))
        .save(scans.join("blank.png"))
        .unwrap();
    std::fs::write(scans.join("broken.png"), b"not a png").unwrap();
    (template, scans)
}
