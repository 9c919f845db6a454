// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Logo-relative rectangle geometry.
//
// A section rectangle is expressed in multiples of the detected logo's width
// and height, so the same parameters describe the same document region no
// matter how the page was scaled or shifted on the scanner glass.

use crate::error::{LocatorError, Result};
use crate::types::{BoundingBox, ImageShape};

/// Clamp a rectangle into an image.
///
/// The origin is clamped first (x into `[0, W-1]`, y into `[0, H-1]`), and
/// the size is then clamped relative to the clamped origin (w into
/// `[1, W-x]`, h into `[1, H-y]`). Callers rely on this order at the image
/// edges: a box hanging off the right side keeps its origin and loses width.
///
/// `shape` must be non-empty; an empty shape yields a 1x1 box at the origin.
pub fn clamp(x: i64, y: i64, w: i64, h: i64, shape: ImageShape) -> BoundingBox {
    let width = i64::from(shape.width);
    let height = i64::from(shape.height);

    let x = x.min(width - 1).max(0);
    let y = y.min(height - 1).max(0);
    let w = w.min(width - x).max(1);
    let h = h.min(height - y).max(1);

    // Every value is now within [0, u32::MAX], and in practice far below
    // i32::MAX for any raster we can decode.
    BoundingBox::new(to_i32(x), to_i32(y), to_i32(w), to_i32(h))
}

/// Clamp an existing box into an image.
pub fn clamp_box(bbox: BoundingBox, shape: ImageShape) -> BoundingBox {
    clamp(
        i64::from(bbox.x),
        i64::from(bbox.y),
        i64::from(bbox.w),
        i64::from(bbox.h),
        shape,
    )
}

/// Edge-offset rectangle relative to `reference`.
///
/// ```text
/// x1 = x + left   * w        x2 = x + w + right  * w
/// y1 = y + top    * h        y2 = y + h + bottom * h
/// ```
///
/// Negative multipliers move an edge left/up. The corners are normalized with
/// min/max, so an inverted parameter set yields the same rectangle as its
/// upright counterpart, and the result is clamped to the image.
pub fn relative_rect(
    shape: ImageShape,
    reference: BoundingBox,
    left_mul: f64,
    top_mul: f64,
    right_mul: f64,
    bottom_mul: f64,
) -> Result<BoundingBox> {
    let shape = shape.ensure_non_empty()?;
    ensure_finite(&[
        ("left_mul", left_mul),
        ("top_mul", top_mul),
        ("right_mul", right_mul),
        ("bottom_mul", bottom_mul),
    ])?;

    let (x, y, w, h) = reference_f64(reference);
    let x1 = round_px(x + left_mul * w);
    let y1 = round_px(y + top_mul * h);
    let x2 = round_px(x + w + right_mul * w);
    let y2 = round_px(y + h + bottom_mul * h);

    Ok(normalize_and_clamp(x1, y1, x2, y2, shape))
}

/// Origin-plus-size rectangle relative to `reference`.
///
/// ```text
/// x1 = x + left * w          x2 = x1 + width  * w
/// y1 = y + top  * h          y2 = y1 + height * h
/// ```
///
/// The far corner is measured from the rounded near corner. Normalization and
/// clamping match [`relative_rect`].
pub fn relative_rect_sized(
    shape: ImageShape,
    reference: BoundingBox,
    left_mul: f64,
    top_mul: f64,
    width_mul: f64,
    height_mul: f64,
) -> Result<BoundingBox> {
    let shape = shape.ensure_non_empty()?;
    ensure_finite(&[
        ("left_mul", left_mul),
        ("top_mul", top_mul),
        ("width_mul", width_mul),
        ("height_mul", height_mul),
    ])?;

    let (x, y, w, h) = reference_f64(reference);
    let x1 = round_px(x + left_mul * w);
    let y1 = round_px(y + top_mul * h);
    let x2 = round_px(x1 as f64 + width_mul * w);
    let y2 = round_px(y1 as f64 + height_mul * h);

    Ok(normalize_and_clamp(x1, y1, x2, y2, shape))
}

fn normalize_and_clamp(x1: i64, y1: i64, x2: i64, y2: i64, shape: ImageShape) -> BoundingBox {
    let (x_min, x_max) = (x1.min(x2), x1.max(x2));
    let (y_min, y_max) = (y1.min(y2), y1.max(y2));
    clamp(x_min, y_min, x_max - x_min, y_max - y_min, shape)
}

fn reference_f64(reference: BoundingBox) -> (f64, f64, f64, f64) {
    (
        f64::from(reference.x),
        f64::from(reference.y),
        f64::from(reference.w),
        f64::from(reference.h),
    )
}

/// Round half to even, then saturate into the coordinate range.
fn round_px(v: f64) -> i64 {
    // i32 bounds keep later `x + w` arithmetic far from overflow.
    v.round_ties_even()
        .clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i64
}

fn to_i32(v: i64) -> i32 {
    i32::try_from(v).unwrap_or(i32::MAX)
}

fn ensure_finite(values: &[(&str, f64)]) -> Result<()> {
    for (name, value) in values {
        if !value.is_finite() {
            return Err(LocatorError::InvalidInput(format!(
                "{name} must be a finite number, got {value}"
            )));
        }
    }
    Ok(())
}
