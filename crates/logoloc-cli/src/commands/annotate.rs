// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// `logoloc annotate`: outline the logo in red and the section in green.
//
// A page without the logo is skipped with a warning. A section that cannot be
// computed is logged and the logo outline is still written.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use logoloc_core::config::LocatorConfig;
use logoloc_detect::{LOGO_COLOR, SECTION_COLOR, ScanImage};
use logoloc_store::JsonProfileStore;
use tracing::{info, warn};

use crate::args::AnnotateArgs;
use crate::session::{SectionSource, Session, collect_images, output_path};

/// Stroke widths for one run.
#[derive(Debug, Clone, Copy)]
struct Strokes {
    logo: u32,
    section: u32,
}

pub fn run(config: &LocatorConfig, args: &AnnotateArgs) -> Result<()> {
    let session = Session::open(config, &args.detection)?;
    let section = SectionSource::resolve(&args.section, || JsonProfileStore::resolve(config))?;
    let strokes = Strokes {
        logo: args.thickness.unwrap_or(config.annotation.bbox_thickness),
        section: args
            .section_thickness
            .or(section.profile_thickness())
            .unwrap_or(config.annotation.section_thickness),
    };

    let inputs = collect_images(&args.input)?;
    std::fs::create_dir_all(&args.out)
        .with_context(|| format!("creating output directory {}", args.out.display()))?;

    let mut failed = 0usize;
    for path in &inputs {
        match annotate_one(&session, &section, strokes, &args.out, path) {
            Ok(Some(dest)) => println!("Saved {}", dest.display()),
            Ok(None) => warn!(image = %path.display(), "Logo not found"),
            Err(err) => {
                warn!(image = %path.display(), error = %format!("{err:#}"), "Image skipped");
                failed += 1;
            }
        }
    }

    info!(total = inputs.len(), failed, "Annotation finished");
    if failed > 0 {
        bail!("{failed} of {} images could not be annotated", inputs.len());
    }
    Ok(())
}

/// `Ok(None)` when the logo is absent.
fn annotate_one(
    session: &Session,
    section: &SectionSource,
    strokes: Strokes,
    out_dir: &Path,
    path: &Path,
) -> Result<Option<PathBuf>> {
    let image = ScanImage::open(path)?;
    let Some(found) = session.detect(&image) else {
        return Ok(None);
    };

    let shape = image.shape();
    let mut annotated = image.annotate(found.bbox, LOGO_COLOR, strokes.logo);
    if section.is_requested() {
        annotated = match section.compute(shape, found.bbox) {
            Ok(bbox) => annotated.annotate(bbox, SECTION_COLOR, strokes.section),
            Err(err) => {
                warn!(image = %path.display(), error = %err, "Section skipped");
                annotated
            }
        };
    }

    let dest = output_path(out_dir, path, "annotated");
    annotated.save(&dest)?;
    Ok(Some(dest))
}
