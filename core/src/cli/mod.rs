pub mod report;

use crate::types::LengthUnit;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Command-line arguments for fibresem
#[derive(Parser, Debug)]
#[command(name = "fibresem")]
#[command(about = "SEM TIFF metadata and pixel calibration inspection tool")]
#[command(version)]
pub struct Cli {
    /// Path to SEM TIFF file
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,

    /// Unit for the reported conversion factor
    #[arg(short, long, default_value = "um", value_parser = parse_unit)]
    pub unit: LengthUnit,

    /// Information bar height as a fraction of the image height
    #[arg(long, default_value_t = crate::types::DEFAULT_BAR_HEIGHT)]
    pub bar_height: f64,

    /// Also list every entry of the vendor metadata block
    #[arg(short, long)]
    pub all: bool,

    /// Verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Output format options
#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format
    Text,
    /// JSON format
    Json,
}

/// Parses a length unit argument (`nm`, `um`, `µm`, `mm`, `m`)
pub fn parse_unit(s: &str) -> std::result::Result<LengthUnit, String> {
    LengthUnit::parse(s).map_err(|e| e.to_string())
}
