// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Section profiles: named, reusable logo-relative rectangles.
//
// In memory a profile is a tagged `Placement`, so each variant carries exactly
// the multipliers it needs. On disk it is the flat `ProfileRecord`, where the
// mode-specific fields are optional; `TryFrom<ProfileRecord>` is the single
// place that checks the mode against the fields present.

use serde::{Deserialize, Serialize};

use crate::error::{LocatorError, Result};
use crate::geometry;
use crate::types::{BoundingBox, ImageShape};

/// Default stroke width for drawing a profile's section rectangle.
pub const DEFAULT_SECTION_THICKNESS: u32 = 3;

/// How a section rectangle is placed relative to the logo.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Placement {
    /// Each edge offset from the matching logo edge.
    Edge {
        left_mul: f64,
        top_mul: f64,
        right_mul: f64,
        bottom_mul: f64,
    },
    /// Origin offset from the logo origin plus a size in logo units.
    Size {
        left_mul: f64,
        top_mul: f64,
        width_mul: f64,
        height_mul: f64,
    },
}

impl Placement {
    pub fn mode(&self) -> ProfileMode {
        match self {
            Self::Edge { .. } => ProfileMode::Edge,
            Self::Size { .. } => ProfileMode::Size,
        }
    }

    /// Resolve the section rectangle for a logo found at `logo`.
    pub fn compute_bbox(&self, shape: ImageShape, logo: BoundingBox) -> Result<BoundingBox> {
        match *self {
            Self::Edge {
                left_mul,
                top_mul,
                right_mul,
                bottom_mul,
            } => geometry::relative_rect(shape, logo, left_mul, top_mul, right_mul, bottom_mul),
            Self::Size {
                left_mul,
                top_mul,
                width_mul,
                height_mul,
            } => geometry::relative_rect_sized(shape, logo, left_mul, top_mul, width_mul, height_mul),
        }
    }
}

/// A named section layout for one kind of form.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub name: String,
    pub section_thickness: u32,
    pub placement: Placement,
}

impl Profile {
    pub fn new(name: impl Into<String>, placement: Placement) -> Self {
        Self {
            name: name.into(),
            section_thickness: DEFAULT_SECTION_THICKNESS,
            placement,
        }
    }

    pub fn compute_bbox(&self, shape: ImageShape, logo: BoundingBox) -> Result<BoundingBox> {
        self.placement.compute_bbox(shape, logo)
    }
}

/// Persisted placement mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileMode {
    #[default]
    Edge,
    Size,
}

impl std::str::FromStr for ProfileMode {
    type Err = LocatorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "edge" => Ok(Self::Edge),
            "size" => Ok(Self::Size),
            other => Err(LocatorError::InvalidInput(format!(
                "unknown profile mode '{other}' (expected edge or size)"
            ))),
        }
    }
}

/// Flat on-disk shape of a profile.
///
/// ```json
/// { "name": "invoice", "mode": "edge", "left_mul": 0.0, "top_mul": 1.0,
///   "right_mul": 1.0, "bottom_mul": 3.0, "width_mul": null,
///   "height_mul": null, "section_thickness": 3 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub name: String,
    #[serde(default)]
    pub mode: ProfileMode,
    pub left_mul: f64,
    pub top_mul: f64,
    #[serde(default)]
    pub right_mul: Option<f64>,
    #[serde(default)]
    pub bottom_mul: Option<f64>,
    #[serde(default)]
    pub width_mul: Option<f64>,
    #[serde(default)]
    pub height_mul: Option<f64>,
    #[serde(default = "default_section_thickness")]
    pub section_thickness: u32,
}

fn default_section_thickness() -> u32 {
    DEFAULT_SECTION_THICKNESS
}

impl ProfileRecord {
    /// Validate the record and resolve its section rectangle.
    pub fn compute_bbox(&self, shape: ImageShape, logo: BoundingBox) -> Result<BoundingBox> {
        Profile::try_from(self.clone())?.compute_bbox(shape, logo)
    }
}

impl TryFrom<ProfileRecord> for Profile {
    type Error = LocatorError;

    fn try_from(record: ProfileRecord) -> Result<Self> {
        let placement = match record.mode {
            ProfileMode::Edge => match (record.right_mul, record.bottom_mul) {
                (Some(right_mul), Some(bottom_mul)) => Placement::Edge {
                    left_mul: record.left_mul,
                    top_mul: record.top_mul,
                    right_mul,
                    bottom_mul,
                },
                _ => {
                    return Err(LocatorError::InvalidInput(format!(
                        "profile '{}': edge mode requires right_mul and bottom_mul",
                        record.name
                    )));
                }
            },
            ProfileMode::Size => match (record.width_mul, record.height_mul) {
                (Some(width_mul), Some(height_mul)) => Placement::Size {
                    left_mul: record.left_mul,
                    top_mul: record.top_mul,
                    width_mul,
                    height_mul,
                },
                _ => {
                    return Err(LocatorError::InvalidInput(format!(
                        "profile '{}': size mode requires width_mul and height_mul",
                        record.name
                    )));
                }
            },
        };

        Ok(Profile {
            name: record.name,
            section_thickness: record.section_thickness,
            placement,
        })
    }
}

impl From<Profile> for ProfileRecord {
    fn from(profile: Profile) -> Self {
        let mut record = ProfileRecord {
            name: profile.name,
            mode: profile.placement.mode(),
            left_mul: 0.0,
            top_mul: 0.0,
            right_mul: None,
            bottom_mul: None,
            width_mul: None,
            height_mul: None,
            section_thickness: profile.section_thickness,
        };
        match profile.placement {
            Placement::Edge {
                left_mul,
                top_mul,
                right_mul,
                bottom_mul,
            } => {
                record.left_mul = left_mul;
                record.top_mul = top_mul;
                record.right_mul = Some(right_mul);
                record.bottom_mul = Some(bottom_mul);
            }
            Placement::Size {
                left_mul,
                top_mul,
                width_mul,
                height_mul,
            } => {
                record.left_mul = left_mul;
                record.top_mul = top_mul;
                record.width_mul = Some(width_mul);
                record.height_mul = Some(height_mul);
            }
        }
        record
    }
}

/// Ad-hoc section multipliers supplied instead of a stored profile.
///
/// Edge placement wins when `right_mul` and `bottom_mul` are both given;
/// otherwise size placement is used when `width_mul` and `height_mul` are.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SectionSpec {
    pub left_mul: Option<f64>,
    pub top_mul: Option<f64>,
    pub right_mul: Option<f64>,
    pub bottom_mul: Option<f64>,
    pub width_mul: Option<f64>,
    pub height_mul: Option<f64>,
}

impl SectionSpec {
    /// True when no section was requested at all.
    pub fn is_empty(&self) -> bool {
        self.left_mul.is_none()
            && self.top_mul.is_none()
            && self.right_mul.is_none()
            && self.bottom_mul.is_none()
            && self.width_mul.is_none()
            && self.height_mul.is_none()
    }

    pub fn placement(&self) -> Result<Placement> {
        let (Some(left_mul), Some(top_mul)) = (self.left_mul, self.top_mul) else {
            return Err(LocatorError::DegenerateGeometry(
                "section requires left_mul and top_mul".into(),
            ));
        };

        if let (Some(right_mul), Some(bottom_mul)) = (self.right_mul, self.bottom_mul) {
            return Ok(Placement::Edge {
                left_mul,
                top_mul,
                right_mul,
                bottom_mul,
            });
        }
        if let (Some(width_mul), Some(height_mul)) = (self.width_mul, self.height_mul) {
            return Ok(Placement::Size {
                left_mul,
                top_mul,
                width_mul,
                height_mul,
            });
        }

        Err(LocatorError::DegenerateGeometry(
            "section requires right_mul and bottom_mul, or width_mul and height_mul".into(),
        ))
    }

    pub fn compute_bbox(&self, shape: ImageShape, logo: BoundingBox) -> Result<BoundingBox> {
        self.placement()?.compute_bbox(shape, logo)
    }
}
