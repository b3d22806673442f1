//! Fishbone - Bone-relative geometry and placement for Ishikawa diagram editors.
//!
//! A fishbone diagram has a horizontal spine ending in an effect box and six
//! slanted category bones. Every cause heading ("block") sits at a parameter
//! `t` along its bone, so its position follows the bone when the canvas,
//! the slant or the measured label sizes change.
//!
//! The crate is organised around one pass:
//!
//! 1. [`bones`] derives bone segments from measured category regions.
//! 2. [`placement`] turns the bones and each block's `t` into ribs, blocks
//!    and labels in logical units.
//! 3. [`mapper`] converts between logical units and rendered pixels.
//!
//! Interactive editing goes through [`DiagramEditor`], which schedules
//! passes and maps pointer drags back to `t` with [`projection`].
//! [`DiagramRenderer`] runs the same pass headless for batch export.

pub mod bones;
pub mod config;
pub mod document;
pub mod drag;
pub mod export;
pub mod mapper;
pub mod measure;
pub mod model;
pub mod placement;
pub mod projection;
pub mod scheduler;

mod editor;
mod error;

pub use fishbone_core::{color, geometry, identifier, stroke};

pub use editor::{DiagramEditor, PassReport};
pub use error::FishboneError;

use log::{debug, info};

use fishbone_core::geometry::{Bounds, Point};

use config::AppConfig;
use export::Exporter;
use mapper::CoordinateMapper;
use measure::StaticMeasurements;
use model::ModelStore;
use placement::DiagramLayout;

/// Headless renderer for saved diagrams.
///
/// The rendered surface is the logical canvas itself, and element sizes are
/// synthesized from the model, so no UI toolkit is needed.
///
/// # Examples
///
/// ```rust
/// use fishbone::{DiagramRenderer, config::AppConfig};
///
/// let renderer = DiagramRenderer::new(AppConfig::default());
/// let store = renderer.load(r#"{"version": 1, "categories": []}"#)
///     .expect("Failed to load");
///
/// let svg = renderer.render_svg(&store).expect("Failed to render");
/// assert!(svg.contains("<svg"));
/// ```
#[derive(Debug, Default)]
pub struct DiagramRenderer {
    config: AppConfig,
}

impl DiagramRenderer {
    /// Create a renderer for the configured canvas.
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    /// A fresh diagram with the configured appearance.
    ///
    /// # Errors
    ///
    /// Returns [`FishboneError::Appearance`] for an invalid appearance section.
    pub fn new_diagram(&self) -> Result<ModelStore, FishboneError> {
        let appearance = self
            .config
            .appearance()
            .to_appearance()
            .map_err(FishboneError::Appearance)?;
        Ok(ModelStore::new(appearance))
    }

    /// Load a diagram from its JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`FishboneError::Import`] if the document is rejected.
    pub fn load(&self, json: &str) -> Result<ModelStore, FishboneError> {
        info!("Loading diagram");
        let store = document::import_json(json)?;
        debug!(blocks = store.blocks().count(); "Diagram loaded");
        Ok(store)
    }

    /// Compute the layout of `store`, in logical units.
    ///
    /// # Errors
    ///
    /// Returns [`FishboneError::Appearance`] for an unusable canvas size.
    pub fn layout(&self, store: &ModelStore) -> Result<DiagramLayout, FishboneError> {
        let canvas = self.config.canvas();
        canvas.validate().map_err(FishboneError::Appearance)?;

        let logical = canvas.size();
        let surface = Bounds::new_from_top_left(Point::default(), logical);
        let mapper = CoordinateMapper::new(logical, surface).ok_or_else(|| {
            FishboneError::Appearance(format!("unusable canvas size {logical:?}"))
        })?;
        let measurements = StaticMeasurements::synthesize(store, &mapper);

        let mut editor = DiagramEditor::new(store.clone(), logical);
        let layout = editor
            .layout(&measurements)
            .cloned()
            .ok_or_else(|| FishboneError::Appearance("canvas could not be measured".into()))?;
        info!(
            bones = layout.bone_paths().len(),
            blocks = layout.block_positions().len();
            "Layout calculated"
        );
        Ok(layout)
    }

    /// Render `store` as an SVG preview.
    pub fn render_svg(&self, store: &ModelStore) -> Result<String, FishboneError> {
        let layout = self.layout(store)?;
        Ok(export::svg::Svg::render_document(store, &layout).to_string())
    }

    /// Render the layout of `store` as JSON.
    pub fn render_layout_json(&self, store: &ModelStore) -> Result<String, FishboneError> {
        let layout = self.layout(store)?;
        export::json::Json::render(&layout)
    }

    /// Lay out `store` and hand it to `exporter`.
    pub fn export(
        &self,
        store: &ModelStore,
        exporter: &dyn Exporter,
    ) -> Result<(), FishboneError> {
        let layout = self.layout(store)?;
        exporter.export_layout(store, &layout)
    }
}
