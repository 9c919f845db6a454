// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Synthetic pages and logos shared by the detector tests.

use image::{GrayImage, Luma, imageops};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub fn white_canvas(width: u32, height: u32) -> GrayImage {
    GrayImage::from_pixel(width, height, Luma([255u8]))
}

/// Random grey 8x8 blocks edge to edge. Rich in corners.
pub fn textured_logo(width: u32, height: u32, seed: u64) -> GrayImage {
    let mut rng = StdRng::seed_from_u64(seed);
    let (bw, bh) = (width.div_ceil(8), height.div_ceil(8));
    let blocks: Vec<u8> = (0..bw * bh).map(|_| rng.gen_range(0..=255)).collect();
    GrayImage::from_fn(width, height, |x, y| {
        Luma([blocks[((y / 8) * bw + x / 8) as usize]])
    })
}

/// Black and white 6x6 blocks inside a 10 px white margin, so the logo's
/// edge map is identical on its own and pasted onto a white page.
pub fn framed_logo(width: u32, height: u32, seed: u64) -> GrayImage {
    const MARGIN: u32 = 10;
    let mut rng = StdRng::seed_from_u64(seed);
    let mut logo = white_canvas(width, height);
    let (bw, bh) = ((width - 2 * MARGIN).div_ceil(6), (height - 2 * MARGIN).div_ceil(6));
    let blocks: Vec<bool> = (0..bw * bh).map(|_| rng.gen_bool(0.5)).collect();
    for y in MARGIN..height - MARGIN {
        for x in MARGIN..width - MARGIN {
            let (bx, by) = ((x - MARGIN) / 6, (y - MARGIN) / 6);
            if blocks[(by * bw + bx) as usize] {
                logo.put_pixel(x, y, Luma([0u8]));
            }
        }
    }
    logo
}

/// Independent uniform noise per pixel.
pub fn noise(width: u32, height: u32, seed: u64) -> GrayImage {
    let mut rng = StdRng::seed_from_u64(seed);
    GrayImage::from_fn(width, height, |_, _| Luma([rng.r#gen::<u8>()]))
}

pub fn paste(canvas: &mut GrayImage, logo: &GrayImage, x: u32, y: u32) {
    imageops::replace(canvas, logo, i64::from(x), i64::from(y));
}
