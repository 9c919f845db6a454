// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// `logoloc detect`: print one detection as JSON.

use anyhow::{Context, Result};
use logoloc_core::config::LocatorConfig;
use logoloc_core::error::LocatorError;
use logoloc_core::DetectionResult;
use logoloc_detect::ScanImage;
use serde::Serialize;

use crate::args::DetectArgs;
use crate::session::Session;

/// Detection plus the page size it refers to.
#[derive(Debug, Serialize)]
pub struct DetectionReport<'a> {
    pub width: u32,
    pub height: u32,
    #[serde(flatten)]
    pub result: &'a DetectionResult,
}

pub fn run(config: &LocatorConfig, args: &DetectArgs) -> Result<()> {
    let session = Session::open(config, &args.detection)?;
    let image = ScanImage::open(&args.input)
        .with_context(|| format!("loading image {}", args.input.display()))?;

    let result = session.detect(&image).ok_or(LocatorError::NotFound)?;
    let report = DetectionReport {
        width: image.width(),
        height: image.height(),
        result: &result,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
