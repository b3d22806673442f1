//! Fishbone CLI library
//!
//! This module contains the core CLI logic for the fishbone diagram tool.

pub mod error_adapter;

mod args;
mod config;

pub use args::{Args, OutputFormat};

use std::fs;

use log::info;

use fishbone::{
    DiagramRenderer, FishboneError, document,
    export::{json::Json, svg::Svg},
};

/// Run the fishbone CLI application
///
/// This function loads the input document (or starts from the default
/// diagram), lays it out on the configured canvas, and writes the requested
/// output format.
///
/// # Errors
///
/// Returns `FishboneError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Rejected documents
/// - Export errors
pub fn run(args: &Args) -> Result<(), FishboneError> {
    let source = args.input.as_ref().map(fs::read_to_string).transpose()?;
    run_with_source(args, source.as_deref())
}

/// Run the CLI on an already read document.
///
/// `source` is `None` when no input was given.
pub fn run_with_source(args: &Args, source: Option<&str>) -> Result<(), FishboneError> {
    info!(
        input_path:? = args.input,
        output_path = args.output,
        format:? = args.format;
        "Processing diagram"
    );

    let app_config = config::load_config(args.config.as_ref())?;
    let app_config = config::with_canvas_overrides(app_config, args.width, args.height)?;

    let renderer = DiagramRenderer::new(app_config);
    let store = match source {
        Some(json) => renderer.load(json)?,
        None => renderer.new_diagram()?,
    };

    match args.format {
        OutputFormat::Svg => renderer.export(&store, &Svg::new(&args.output))?,
        OutputFormat::Layout => renderer.export(&store, &Json::new(&args.output))?,
        OutputFormat::Document => {
            let json = document::export_json(&store)
                .map_err(|err| FishboneError::Export(Box::new(err)))?;
            fs::write(&args.output, json)?;
        }
    }

    info!(output_file = args.output; "Diagram exported successfully");

    Ok(())
}
