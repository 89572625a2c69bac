// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line interface definition.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use folio_core::FolioConfig;
use folio_core::types::{EnhancementLevel, Orientation, PaperSize};

/// Turn a stack of images into a single PDF, sharpening them as far as this
/// device comfortably allows.
#[derive(Parser, Debug)]
#[command(name = "folio", version)]
#[command(about = "Turn a stack of images into a single PDF")]
pub struct Cli {
    /// Settings file (JSON). Defaults to $XDG_CONFIG_HOME/folio/config.json.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Ingest, order, enhance, and write the PDF.
    Build(BuildArgs),
    /// Print the inferred page order as JSON.
    Order {
        /// Image files or directories.
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },
    /// Print the device profile and processing budget as JSON.
    Assess,
}

/// Enhancement level as typed by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelArg {
    Fixed(EnhancementLevel),
    /// Whatever the current budget recommends.
    Auto,
}

#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Image files or directories (JPEG, PNG, GIF, WEBP).
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Output PDF path.
    #[arg(short, long, default_value = "folio.pdf")]
    pub output: PathBuf,

    /// Sharpening: 0-3, off/light/medium/strong, or auto.
    #[arg(short, long, value_parser = parse_level)]
    pub level: Option<LevelArg>,

    /// Paper size: a3, a4, a5, letter, legal, tabloid.
    #[arg(long, value_parser = parse_paper)]
    pub paper: Option<PaperSize>,

    #[arg(long)]
    pub landscape: bool,

    /// Page margin in millimetres.
    #[arg(long)]
    pub margin: Option<f32>,

    /// Title stored in the PDF metadata.
    #[arg(long)]
    pub title: Option<String>,

    /// Keep the input order instead of guessing one from the file names.
    #[arg(long)]
    pub no_order: bool,
}

impl BuildArgs {
    /// Fold command-line overrides into the loaded settings.
    pub fn apply_to(&self, config: &mut FolioConfig) {
        if let Some(paper) = self.paper {
            config.paper_size = paper;
        }
        if self.landscape {
            config.orientation = Orientation::Landscape;
        }
        if let Some(margin) = self.margin {
            config.margin_mm = margin;
        }
        if let Some(title) = &self.title {
            config.document_title = title.clone();
        }
        if let Some(LevelArg::Fixed(level)) = self.level {
            config.default_level = level;
        }
    }
}

pub fn parse_level(value: &str) -> Result<LevelArg, String> {
    let level = match value.to_ascii_lowercase().as_str() {
        "auto" => return Ok(LevelArg::Auto),
        "off" | "none" => EnhancementLevel::Off,
        "light" => EnhancementLevel::Light,
        "medium" => EnhancementLevel::Medium,
        "strong" => EnhancementLevel::Strong,
        other => other
            .parse::<u8>()
            .ok()
            .and_then(EnhancementLevel::from_index)
            .ok_or_else(|| format!("unknown level '{value}', expected 0-3 or off/light/medium/strong/auto"))?,
    };
    Ok(LevelArg::Fixed(level))
}

pub fn parse_paper(value: &str) -> Result<PaperSize, String> {
    PaperSize::from_name(value).ok_or_else(|| format!("unknown paper size '{value}'"))
}
