// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan raster: decode, crop, annotate, encode. Operates on in-memory images
// using the `image` and `imageproc` crates.

use std::path::Path;

use image::{DynamicImage, GrayImage, ImageFormat, Rgb};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use logoloc_core::error::{LocatorError, Result};
use logoloc_core::geometry::clamp_box;
use logoloc_core::{BoundingBox, ImageShape};
use tracing::{debug, info, instrument};

/// Stroke colour for the detected logo.
pub const LOGO_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
/// Stroke colour for the derived section.
pub const SECTION_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

/// A decoded scan page.
///
/// Detection only ever reads the raster. `crop` and `annotate` consume `self`
/// and return a new `ScanImage`, so chains read top to bottom:
///
/// ```ignore
/// let png = ScanImage::open("page.png")?
///     .annotate(logo, LOGO_COLOR, 4)
///     .annotate(section, SECTION_COLOR, 3)
///     .to_png_bytes()?;
/// ```
#[derive(Debug, Clone)]
pub struct ScanImage {
    image: DynamicImage,
}

impl ScanImage {
    // -- Construction ---------------------------------------------------------

    /// Load an image from a file path.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let img = image::open(path).map_err(|err| match err {
            image::ImageError::IoError(io) => LocatorError::Io(io),
            other => LocatorError::InvalidInput(format!(
                "cannot decode image {}: {other}",
                path.display()
            )),
        })?;
        info!(width = img.width(), height = img.height(), "Image loaded");
        Ok(Self { image: img })
    }

    /// Decode raw encoded bytes (PNG, JPEG, TIFF, BMP).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let img = image::load_from_memory(data)
            .map_err(|err| LocatorError::InvalidInput(format!("cannot decode image: {err}")))?;
        debug!(
            width = img.width(),
            height = img.height(),
            "Image decoded from bytes"
        );
        Ok(Self { image: img })
    }

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn shape(&self) -> ImageShape {
        ImageShape::new(self.image.width(), self.image.height())
    }

    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    /// Single-channel intensity view used by both detectors.
    pub fn to_gray(&self) -> GrayImage {
        self.image.to_luma8()
    }

    // -- Transformations (consume self, return new Self) -----------------------

    /// Cut out `bbox`, clamped to the image first.
    #[instrument(skip(self), fields(%bbox))]
    pub fn crop(self, bbox: BoundingBox) -> Result<Self> {
        let shape = self.shape().ensure_non_empty()?;
        let safe = clamp_box(bbox, shape);
        info!(%safe, "Cropping image");
        // clamp_box guarantees non-negative, in-bounds values.
        let cropped =
            self.image
                .crop_imm(safe.x as u32, safe.y as u32, safe.w as u32, safe.h as u32);
        Ok(Self { image: cropped })
    }

    /// Draw a hollow rectangle `thickness` pixels wide, growing inward from
    /// `bbox`. The result is always RGB.
    #[instrument(skip(self, color), fields(%bbox, thickness))]
    pub fn annotate(self, bbox: BoundingBox, color: Rgb<u8>, thickness: u32) -> Self {
        let mut canvas = self.image.into_rgb8();

        for inset in 0..thickness.max(1) as i32 {
            let w = bbox.w - 2 * inset;
            let h = bbox.h - 2 * inset;
            if w <= 0 || h <= 0 {
                break;
            }
            let rect = Rect::at(bbox.x + inset, bbox.y + inset).of_size(w as u32, h as u32);
            draw_hollow_rect_mut(&mut canvas, rect, color);
        }

        debug!("Annotation drawn");
        Self {
            image: DynamicImage::ImageRgb8(canvas),
        }
    }

    // -- Output ---------------------------------------------------------------

    /// Encode the current image as PNG bytes.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut buffer);
        self.image
            .write_to(&mut cursor, ImageFormat::Png)
            .map_err(|err| LocatorError::ImageError(format!("PNG encoding failed: {err}")))?;
        Ok(buffer)
    }

    /// Write the image to a file. The format is inferred from the extension.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        self.image.save(path.as_ref()).map_err(|err| {
            LocatorError::ImageError(format!(
                "failed to save image to {}: {err}",
                path.as_ref().display()
            ))
        })
    }
}

impl From<DynamicImage> for ScanImage {
    fn from(image: DynamicImage) -> Self {
        Self::from_dynamic(image)
    }
}

// -- Tests --------------------------------------------------------------------
