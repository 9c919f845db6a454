// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for logo detection results.

use serde::{Deserialize, Serialize};

use crate::error::{LocatorError, Result};

/// Pixel dimensions of a decoded image.
///
/// Geometry never needs the raster itself, only its extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageShape {
    pub width: u32,
    pub height: u32,
}

impl ImageShape {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Reject shapes that cannot hold a single pixel.
    pub fn ensure_non_empty(self) -> Result<Self> {
        if self.width == 0 || self.height == 0 {
            return Err(LocatorError::InvalidInput(format!(
                "image shape {}x{} has no pixels",
                self.width, self.height
            )));
        }
        Ok(self)
    }
}

/// Axis-aligned integer rectangle, top-left origin.
///
/// Serialized as `[x, y, w, h]`, the shape every downstream consumer of the
/// detection JSON expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[i32; 4]", into = "[i32; 4]")]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl BoundingBox {
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// Exclusive right edge.
    pub fn right(&self) -> i32 {
        self.x + self.w
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> i32 {
        self.y + self.h
    }

    /// Corners in clockwise order starting at the top-left.
    pub fn corners(&self) -> Polygon {
        Polygon([
            Point::new(self.x, self.y),
            Point::new(self.right(), self.y),
            Point::new(self.right(), self.bottom()),
            Point::new(self.x, self.bottom()),
        ])
    }
}

impl From<[i32; 4]> for BoundingBox {
    fn from([x, y, w, h]: [i32; 4]) -> Self {
        Self { x, y, w, h }
    }
}

impl From<BoundingBox> for [i32; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.x, b.y, b.w, b.h]
    }
}

impl std::fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}, {}, {}]", self.x, self.y, self.w, self.h)
    }
}

/// Integer image coordinate, serialized as `[x, y]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[i32; 2]", into = "[i32; 2]")]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<[i32; 2]> for Point {
    fn from([x, y]: [i32; 2]) -> Self {
        Self { x, y }
    }
}

impl From<Point> for [i32; 2] {
    fn from(p: Point) -> Self {
        [p.x, p.y]
    }
}

/// Projected logo outline: four points, template corners in the order
/// top-left, top-right, bottom-right, bottom-left.
///
/// Not clamped: a homography may place corners outside the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Polygon(pub [Point; 4]);

impl Polygon {
    pub fn points(&self) -> &[Point; 4] {
        &self.0
    }
}

/// Which detector produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionMethod {
    /// Keypoint matching with homography verification.
    Orb,
    /// Multi-scale edge-template correlation.
    Template,
}

impl DetectionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Orb => "orb",
            Self::Template => "template",
        }
    }
}

impl std::fmt::Display for DetectionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Detector selection requested by a caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MethodChoice {
    /// Feature matching first, template matching as fallback.
    #[default]
    Auto,
    Orb,
    Template,
}

impl MethodChoice {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Orb => "orb",
            Self::Template => "template",
        }
    }
}

impl std::fmt::Display for MethodChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MethodChoice {
    type Err = LocatorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "auto" => Ok(Self::Auto),
            "orb" => Ok(Self::Orb),
            "template" => Ok(Self::Template),
            other => Err(LocatorError::InvalidInput(format!(
                "unknown detection method '{other}' (expected auto, orb, or template)"
            ))),
        }
    }
}

/// Outcome of a successful logo detection.
///
/// `confidence` is advisory: the feature detector reports an inlier ratio
/// clipped to [0, 1], the template detector a raw correlation score in
/// roughly [-1, 1]. The two are not on a common scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub method: DetectionMethod,
    pub confidence: f32,
    pub bbox: BoundingBox,
    pub polygon: Polygon,
}
