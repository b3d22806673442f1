//! JSON dump of a computed layout.

use std::fs;

use log::info;

use crate::{
    error::FishboneError, export::Exporter, model::ModelStore, placement::DiagramLayout,
};

/// Writes the layout of a diagram as pretty-printed JSON.
#[derive(Debug, Clone)]
pub struct Json {
    file_name: String,
}

impl Json {
    pub fn new(file_name: &str) -> Self {
        Self {
            file_name: file_name.to_string(),
        }
    }

    /// Serializes `layout` to a JSON string.
    pub fn render(layout: &DiagramLayout) -> Result<String, FishboneError> {
        serde_json::to_string_pretty(layout).map_err(|err| FishboneError::Export(Box::new(err)))
    }
}

impl Exporter for Json {
    fn export_layout(&self, _store: &ModelStore, layout: &DiagramLayout) -> Result<(), FishboneError> {
        let content = Self::render(layout)?;
        fs::write(&self.file_name, content)?;
        info!(file_name = self.file_name; "Layout JSON written");
        Ok(())
    }
}
