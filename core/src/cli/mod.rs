pub mod report;

use crate::error::Result;
use crate::extraction::tags::DEFAULT_INSPECT_TAGS;
use crate::types::TagName;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Command-line arguments for dcmtags
#[derive(Parser, Debug)]
#[command(name = "dcmtags")]
#[command(about = "Print normalized DICOM tag values of a single file")]
#[command(version)]
pub struct Cli {
    /// Path to DICOM file
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Tag to read, as keyword (SeriesNumber) or group,element (0020,0011).
    /// May be repeated.
    #[arg(short, long = "tag", value_name = "TAG")]
    pub tags: Vec<String>,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,

    /// Verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Requested tags, or the default set when none were given
    pub fn tag_names(&self) -> Result<Vec<TagName>> {
        if self.tags.is_empty() {
            DEFAULT_INSPECT_TAGS.iter().map(|t| TagName::parse(t)).collect()
        } else {
            self.tags.iter().map(|t| TagName::parse(t)).collect()
        }
    }
}

/// Output format options
#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format
    Text,
    /// JSON format
    Json,
}

/// Initialises env_logger, honouring RUST_LOG on top of the base level
pub fn setup_logging(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}
