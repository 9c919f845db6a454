// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use logoloc_core::{MethodChoice, ProfileMode, SectionSpec};

#[derive(Parser, Debug)]
#[command(name = "logoloc")]
#[command(about = "Locate a known logo in scanned documents and crop logo-relative sections")]
#[command(version)]
pub struct Cli {
    /// JSON configuration file. Environment variables override it.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Draw the detected logo (and optional section) onto each image.
    Annotate(AnnotateArgs),

    /// Print the detection for one image as JSON.
    Detect(DetectArgs),

    /// Crop the logo-relative section out of each image.
    Cut(CutArgs),

    /// Manage stored section profiles.
    #[command(subcommand)]
    Profiles(ProfilesCommand),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum MethodArg {
    /// ORB first, edge templates as fallback.
    #[default]
    Auto,
    Orb,
    Template,
}

impl From<MethodArg> for MethodChoice {
    fn from(arg: MethodArg) -> Self {
        match arg {
            MethodArg::Auto => MethodChoice::Auto,
            MethodArg::Orb => MethodChoice::Orb,
            MethodArg::Template => MethodChoice::Template,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Right and bottom offsets from the logo's far edges.
    Edge,
    /// Width and height as multiples of the logo.
    Size,
}

impl From<ModeArg> for ProfileMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Edge => ProfileMode::Edge,
            ModeArg::Size => ProfileMode::Size,
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct DetectionArgs {
    /// Logo template image. Defaults to the configured template.
    #[arg(long, value_name = "FILE")]
    pub template: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = MethodArg::Auto)]
    pub method: MethodArg,
}

/// Section selection: a stored profile or explicit multipliers.
#[derive(Debug, Clone, Default, Args)]
pub struct SectionArgs {
    /// Stored profile name.
    #[arg(long, value_name = "NAME")]
    pub profile: Option<String>,

    /// Left offset in multiples of logo width.
    #[arg(long, allow_negative_numbers = true, conflicts_with = "profile")]
    pub section_left_mul: Option<f64>,

    /// Top offset in multiples of logo height.
    #[arg(long, allow_negative_numbers = true, conflicts_with = "profile")]
    pub section_top_mul: Option<f64>,

    /// Right offset in multiples of logo width (edge mode).
    #[arg(long, allow_negative_numbers = true, conflicts_with = "profile")]
    pub section_right_mul: Option<f64>,

    /// Bottom offset in multiples of logo height (edge mode).
    #[arg(long, allow_negative_numbers = true, conflicts_with = "profile")]
    pub section_bottom_mul: Option<f64>,

    /// Width in multiples of logo width (size mode).
    #[arg(long, allow_negative_numbers = true, conflicts_with = "profile")]
    pub section_width_mul: Option<f64>,

    /// Height in multiples of logo height (size mode).
    #[arg(long, allow_negative_numbers = true, conflicts_with = "profile")]
    pub section_height_mul: Option<f64>,
}

impl SectionArgs {
    pub fn spec(&self) -> SectionSpec {
        SectionSpec {
            left_mul: self.section_left_mul,
            top_mul: self.section_top_mul,
            right_mul: self.section_right_mul,
            bottom_mul: self.section_bottom_mul,
            width_mul: self.section_width_mul,
            height_mul: self.section_height_mul,
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct AnnotateArgs {
    /// Image file, or a directory of png/jpg/jpeg/tif/tiff/bmp files.
    pub input: PathBuf,

    #[command(flatten)]
    pub detection: DetectionArgs,

    /// Output directory.
    #[arg(long, default_value = "out")]
    pub out: PathBuf,

    /// Logo rectangle stroke width. Defaults to the configured value.
    #[arg(long)]
    pub thickness: Option<u32>,

    #[command(flatten)]
    pub section: SectionArgs,

    /// Section rectangle stroke width. Defaults to the profile's, then the
    /// configured value.
    #[arg(long)]
    pub section_thickness: Option<u32>,
}

#[derive(Debug, Clone, Args)]
pub struct DetectArgs {
    pub input: PathBuf,

    #[command(flatten)]
    pub detection: DetectionArgs,
}

#[derive(Debug, Clone, Args)]
pub struct CutArgs {
    /// Image file, or a directory of png/jpg/jpeg/tif/tiff/bmp files.
    pub input: PathBuf,

    #[command(flatten)]
    pub detection: DetectionArgs,

    /// Output directory for sections and manifest.json.
    #[arg(long, default_value = "out")]
    pub out: PathBuf,

    #[command(flatten)]
    pub section: SectionArgs,
}

#[derive(Subcommand, Debug)]
pub enum ProfilesCommand {
    /// Print every stored profile as JSON.
    List,

    /// Print one profile as JSON.
    Get { name: String },

    /// Create or replace a profile.
    Put(PutArgs),

    /// Remove a profile.
    Delete { name: String },
}

#[derive(Debug, Clone, Args)]
pub struct PutArgs {
    pub name: String,

    #[arg(long, value_enum, default_value_t = ModeArg::Edge)]
    pub mode: ModeArg,

    #[arg(long, allow_negative_numbers = true)]
    pub left_mul: f64,

    #[arg(long, allow_negative_numbers = true)]
    pub top_mul: f64,

    #[arg(long, allow_negative_numbers = true)]
    pub right_mul: Option<f64>,

    #[arg(long, allow_negative_numbers = true)]
    pub bottom_mul: Option<f64>,

    #[arg(long, allow_negative_numbers = true)]
    pub width_mul: Option<f64>,

    #[arg(long, allow_negative_numbers = true)]
    pub height_mul: Option<f64>,

    #[arg(long, default_value_t = logoloc_core::profile::DEFAULT_SECTION_THICKNESS)]
    pub section_thickness: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn annotate_parses_section_multipliers() {
        let cli = Cli::try_parse_from([
            "logoloc",
            "annotate",
            "scans",
            "--template",
            "logo.png",
            "--section-left-mul",
            "-0.5",
            "--section-top-mul",
            "1",
            "--section-width-mul",
            "2",
            "--section-height-mul",
            "3",
        ])
        .unwrap();
        let Commands::Annotate(args) = cli.command else {
            panic!("expected annotate");
        };
        assert_eq!(args.detection.method, MethodArg::Auto);
        assert_eq!(args.out, PathBuf::from("out"));
        let spec = args.section.spec();
        assert_eq!(spec.left_mul, Some(-0.5));
        assert_eq!(spec.right_mul, None);
        assert_eq!(spec.height_mul, Some(3.0));
    }

    #[test]
    fn profile_conflicts_with_explicit_multipliers() {
        let err = Cli::try_parse_from([
            "logoloc",
            "cut",
            "a.png",
            "--profile",
            "invoice",
            "--section-left-mul",
            "0",
        ])
        .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn unknown_method_is_rejected() {
        assert!(Cli::try_parse_from(["logoloc", "detect", "a.png", "--method", "sift"]).is_err());
    }

    #[test]
    fn profiles_put_defaults_to_edge() {
        let cli = Cli::try_parse_from([
            "logoloc", "profiles", "put", "invoice", "--left-mul", "0", "--top-mul", "1",
            "--right-mul", "1", "--bottom-mul", "3",
        ])
        .unwrap();
        let Commands::Profiles(ProfilesCommand::Put(put)) = cli.command else {
            panic!("expected profiles put");
        };
        assert_eq!(put.mode, ModeArg::Edge);
        assert_eq!(put.section_thickness, 3);
    }
}
