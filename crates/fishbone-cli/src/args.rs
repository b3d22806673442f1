//! Command-line argument definitions for the fishbone CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments control input/output paths, the output format,
//! the logical canvas, configuration file selection, and logging verbosity.

use clap::{Parser, ValueEnum};

/// What the CLI writes to the output file.
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// SVG preview of the laid-out diagram
    #[default]
    Svg,
    /// Computed placements (bones, ribs, blocks, labels) as JSON
    Layout,
    /// The normalized diagram document
    Document,
}

/// Command-line arguments for the fishbone diagram tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input diagram document (JSON). A default diagram is
    /// rendered when omitted.
    #[arg(help = "Path to the input file")]
    pub input: Option<String>,

    /// Path to the output file
    #[arg(short, long, default_value = "out.svg")]
    pub output: String,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Svg)]
    pub format: OutputFormat,

    /// Logical canvas width, overriding the configuration
    #[arg(long)]
    pub width: Option<f32>,

    /// Logical canvas height, overriding the configuration
    #[arg(long)]
    pub height: Option<f32>,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}
