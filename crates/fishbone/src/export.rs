//! Exporters for computed layouts.
//!
//! - [`svg::Svg`] renders a static preview of the diagram.
//! - [`json::Json`] dumps the placement data for other tools.

pub mod json;
pub mod svg;

use crate::{error::FishboneError, model::ModelStore, placement::DiagramLayout};

/// Writes a laid-out diagram somewhere.
pub trait Exporter {
    /// Exports `layout`, computed for `store`.
    fn export_layout(&self, store: &ModelStore, layout: &DiagramLayout) -> Result<(), FishboneError>;
}
