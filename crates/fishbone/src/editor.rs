//! The editing session facade.
//!
//! [`DiagramEditor`] owns the single [`ModelStore`] and is the only place that
//! mutates it. Every mutation goes through one of three paths, each marking
//! the matching [`Invalidation`]:
//!
//! - structural edits rebuild the panels at once and defer geometry to the
//!   next [`DiagramEditor::on_paint`];
//! - appearance edits recompute bones and placement immediately;
//! - resize notifications are queued and applied, placement only, on the next
//!   paint.
//!
//! Within a pass, panels are rebuilt before bones, and bones before placement.
//! A category whose bone could not be measured keeps bone work pending until
//! a later pass builds it.

use std::{cell::RefCell, collections::HashSet, rc::Rc};

use indexmap::IndexMap;
use log::{debug, info, trace, warn};

use fishbone_core::{
    geometry::{Point, Size},
    identifier::Id,
};

use crate::{
    bones::{Bone, BoneGeometryBuilder},
    config::AppConfig,
    document,
    drag::{DragController, DragSession, DragState},
    error::FishboneError,
    mapper::CoordinateMapper,
    measure::{ElementId, LayoutMeasurementProvider, PanelSurface, ResizeSource},
    model::{Appearance, ModelStore},
    placement::{DiagramLayout, PlacementEngine},
    scheduler::{Invalidation, RenderScheduler},
};

/// What the last layout pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Bones were rebuilt rather than reused.
    pub rebuilt_bones: bool,
    /// Number of queued resizes applied before placement.
    pub applied_resizes: usize,
}

/// An interactive editing session over one diagram.
///
/// # Examples
///
/// ```
/// use fishbone::{DiagramEditor, mapper::CoordinateMapper, measure::StaticMeasurements};
/// use fishbone_core::geometry::{Bounds, Point, Size};
///
/// let mut editor = DiagramEditor::default();
/// let surface = Bounds::new_from_top_left(Point::default(), Size::new(1200.0, 720.0));
/// let mapper = CoordinateMapper::new(editor.logical_size(), surface).unwrap();
/// let measurements = StaticMeasurements::synthesize(editor.store(), &mapper);
///
/// let layout = editor.layout(&measurements).expect("surface is measured");
/// assert_eq!(layout.bone_paths().len(), 6);
/// ```
pub struct DiagramEditor {
    store: ModelStore,
    logical: Size,
    drag: DragController,
    scheduler: RenderScheduler,
    panels: Option<Box<dyn PanelSurface>>,
    resizes: Option<Rc<RefCell<dyn ResizeSource>>>,
    subscribed: HashSet<ElementId>,
    bones: IndexMap<Id, Bone>,
    mapper: Option<CoordinateMapper>,
    layout: Option<DiagramLayout>,
    last_pass: Option<PassReport>,
}

impl Default for DiagramEditor {
    fn default() -> Self {
        Self::new(ModelStore::default(), Size::new(1200.0, 720.0))
    }
}

impl DiagramEditor {
    /// Creates a session over `store` with a logical canvas of `logical` units.
    pub fn new(store: ModelStore, logical: Size) -> Self {
        let mut scheduler = RenderScheduler::new();
        scheduler.invalidate(Invalidation::Structure);
        Self {
            store,
            logical,
            drag: DragController::new(),
            scheduler,
            panels: None,
            resizes: None,
            subscribed: HashSet::new(),
            bones: IndexMap::new(),
            mapper: None,
            layout: None,
            last_pass: None,
        }
    }

    /// Creates a session with the default model, using the configured canvas
    /// and appearance.
    ///
    /// # Errors
    ///
    /// Returns [`FishboneError::Appearance`] if the configuration is invalid.
    pub fn from_config(config: &AppConfig) -> Result<Self, FishboneError> {
        config.canvas().validate().map_err(FishboneError::Appearance)?;
        let appearance = config
            .appearance()
            .to_appearance()
            .map_err(FishboneError::Appearance)?;
        Ok(Self::new(ModelStore::new(appearance), config.canvas().size()))
    }

    /// Attaches the panel layer rebuilt on structural edits.
    pub fn set_panels(&mut self, panels: Box<dyn PanelSurface>) {
        self.panels = Some(panels);
        self.rebuild_panels();
    }

    pub fn store(&self) -> &ModelStore {
        &self.store
    }

    pub fn logical_size(&self) -> Size {
        self.logical
    }

    /// Bones from the last pass that built them.
    pub fn bones(&self) -> &IndexMap<Id, Bone> {
        &self.bones
    }

    /// The layout from the last pass, in logical units.
    pub fn current_layout(&self) -> Option<&DiagramLayout> {
        self.layout.as_ref()
    }

    /// The mapper from the last pass with a measurable surface.
    pub fn mapper(&self) -> Option<&CoordinateMapper> {
        self.mapper.as_ref()
    }

    pub fn last_pass(&self) -> Option<PassReport> {
        self.last_pass
    }

    pub fn pending(&self) -> Option<Invalidation> {
        self.scheduler.pending()
    }

    pub fn drag_state(&self) -> DragState {
        self.drag.state()
    }

    /// Runs a full pass (bones and placement) against `measurements`.
    ///
    /// Returns `None`, writing nothing, while the surface has no usable size.
    pub fn layout(
        &mut self,
        measurements: &dyn LayoutMeasurementProvider,
    ) -> Option<&DiagramLayout> {
        self.run_pass(measurements, true)
    }

    /// Runs whatever work is pending after the surface has painted.
    ///
    /// Queued resizes are applied first. Structural and appearance work
    /// rebuild bones; resize-only work reuses the cached ones.
    pub fn on_paint(
        &mut self,
        measurements: &dyn LayoutMeasurementProvider,
    ) -> Option<&DiagramLayout> {
        let Some(kind) = self.scheduler.pending() else {
            return self.layout.as_ref();
        };
        trace!(kind:?; "Paint with pending work");
        self.run_pass(measurements, kind.rebuilds_bones())
    }

    /// Applies a structural edit: the model changes, panels are rebuilt now
    /// and geometry waits for the next paint.
    pub fn edit_structure<R>(
        &mut self,
        edit: impl FnOnce(&mut ModelStore) -> Result<R, FishboneError>,
    ) -> Result<R, FishboneError> {
        let result = edit(&mut self.store)?;
        self.scheduler.invalidate(Invalidation::Structure);
        self.rebuild_panels();
        self.subscribe_new_elements();
        Ok(result)
    }

    /// Applies an appearance edit and recomputes geometry immediately.
    pub fn edit_appearance(
        &mut self,
        measurements: &dyn LayoutMeasurementProvider,
        edit: impl FnOnce(&mut Appearance),
    ) -> Option<&DiagramLayout> {
        edit(self.store.appearance_mut());
        self.scheduler.invalidate(Invalidation::Appearance);
        self.run_pass(measurements, true)
    }

    /// Subscribes to size changes of the effect box and of every block.
    ///
    /// The source is kept, so blocks added by later structural edits or an
    /// import are subscribed too. Notifications are coalesced per element and
    /// applied on the next paint.
    pub fn subscribe_resizes(&mut self, source: Rc<RefCell<dyn ResizeSource>>) {
        self.resizes = Some(source);
        self.subscribed.clear();
        self.subscribe_new_elements();
    }

    /// Queues a size change of `element`, in pixels.
    pub fn notify_resize(&mut self, element: ElementId, size: Size) {
        self.scheduler.resize_queue().push(element, size);
    }

    pub fn get_t(&self, block: Id) -> Option<f32> {
        self.store.get_t(block)
    }

    /// Writes a block parameter (clamped) and schedules placement.
    pub fn set_t(&mut self, block: Id, t: f32) -> Result<f32, FishboneError> {
        let stored = self.store.set_t(block, t)?;
        self.scheduler.invalidate(Invalidation::Resize);
        Ok(stored)
    }

    /// Inserts a heading next to `near` in `category`.
    pub fn insert_block(&mut self, category: Id, near: Option<Id>) -> Result<Id, FishboneError> {
        self.edit_structure(|store| store.insert_block(category, near))
    }

    /// Removes a heading, clearing the drag session if it held the focus.
    pub fn remove_block(&mut self, block: Id) -> Result<(), FishboneError> {
        self.edit_structure(|store| store.remove_block(block))?;
        if self.drag.release_block(block) {
            info!(block:% = block; "Dragged block removed, drag cleared");
        }
        Ok(())
    }

    /// Begins dragging `block` from the pixel point `pointer`.
    ///
    /// # Errors
    ///
    /// Returns [`FishboneError::Drag`] if a session is already active, the
    /// block is unknown, or its category has no bone in the current pass.
    pub fn on_drag_start(
        &mut self,
        block: Id,
        pointer: Point,
    ) -> Result<DragSession, FishboneError> {
        let press = self.pointer_to_logical(block, pointer)?;
        Ok(self.drag.begin(&self.store, &self.bones, block, press)?)
    }

    /// Moves the active drag to the pixel point `pointer` and re-runs
    /// placement at once.
    ///
    /// Returns the updated layout, or `None` when no session is active.
    pub fn on_drag_move(
        &mut self,
        measurements: &dyn LayoutMeasurementProvider,
        pointer: Point,
    ) -> Result<Option<&DiagramLayout>, FishboneError> {
        let Some(mapper) = self.mapper else {
            return Ok(None);
        };
        let logical = mapper.to_logical(pointer);
        if self.drag.update(&mut self.store, &self.bones, logical)?.is_none() {
            return Ok(None);
        }
        Ok(self.run_pass(measurements, false))
    }

    pub fn on_drag_end(&mut self) -> Option<DragSession> {
        self.drag.end()
    }

    pub fn on_drag_cancel(&mut self) -> Option<DragSession> {
        self.drag.cancel()
    }

    /// Replaces the model with an imported document.
    ///
    /// On any error the current model, drag state and layout are untouched.
    pub fn import_json(&mut self, json: &str) -> Result<(), FishboneError> {
        let store = document::import_json(json).inspect_err(|err| {
            warn!(err:%; "Import rejected, keeping current diagram");
        })?;

        self.drag.cancel();
        self.store = store;
        self.bones.clear();
        self.scheduler.invalidate(Invalidation::Structure);
        self.rebuild_panels();
        self.subscribe_new_elements();
        info!(blocks = self.store.blocks().count(); "Diagram imported");
        Ok(())
    }

    pub fn export_json(&self) -> Result<String, FishboneError> {
        document::export_json(&self.store).map_err(|err| FishboneError::Export(Box::new(err)))
    }

    fn pointer_to_logical(&self, block: Id, pointer: Point) -> Result<Point, FishboneError> {
        match self.mapper {
            Some(mapper) => Ok(mapper.to_logical(pointer)),
            None => {
                let category = self
                    .store
                    .category_of(block)
                    .ok_or(FishboneError::UnknownBlock(block))?;
                Err(crate::drag::DragError::BoneUnavailable(category.id()).into())
            }
        }
    }

    fn subscribe_new_elements(&mut self) {
        let Some(source) = self.resizes.as_ref() else {
            return;
        };
        let queue = self.scheduler.resize_queue();
        let elements = std::iter::once(ElementId::EffectBox)
            .chain(self.store.blocks().map(|(_, block)| ElementId::Block(block.id())));

        let mut source = source.borrow_mut();
        for element in elements {
            if self.subscribed.insert(element) {
                trace!(element:% = element; "Subscribed to resizes");
                source.on_resize(element, queue.callback(element));
            }
        }
    }

    fn rebuild_panels(&mut self) {
        if let Some(panels) = self.panels.as_mut() {
            panels.rebuild(&self.store);
        }
    }

    fn run_pass(
        &mut self,
        measurements: &dyn LayoutMeasurementProvider,
        rebuild_bones: bool,
    ) -> Option<&DiagramLayout> {
        let Some(mapper) = measurements
            .measure(&ElementId::Surface)
            .and_then(|surface| CoordinateMapper::new(self.logical, surface))
        else {
            debug!("Surface not measurable, layout skipped");
            return None;
        };
        self.mapper = Some(mapper);

        let pending = self.scheduler.take();
        let applied_resizes = self.apply_resizes(&mapper);

        let rebuild_bones = rebuild_bones
            || pending.is_some_and(Invalidation::rebuilds_bones)
            || self.bones.len() < self.store.categories().len();
        if rebuild_bones {
            self.bones = BoneGeometryBuilder::new(self.logical, self.store.appearance())
                .build(self.store.categories(), measurements);

            let missing = self.store.categories().len().saturating_sub(self.bones.len());
            if missing > 0 {
                debug!(missing; "Bones skipped, retrying on the next paint");
                self.scheduler.invalidate(Invalidation::Appearance);
            }
        }

        let layout = PlacementEngine::new(&mapper, self.store.appearance()).layout(
            &self.store,
            &self.bones,
            measurements,
        );
        self.last_pass = Some(PassReport {
            rebuilt_bones: rebuild_bones,
            applied_resizes,
        });
        debug!(rebuilt_bones = rebuild_bones, applied_resizes:?; "Layout pass complete");
        self.layout = Some(layout);
        self.layout.as_ref()
    }

    fn apply_resizes(&mut self, mapper: &CoordinateMapper) -> usize {
        let resizes = self.scheduler.resize_queue().drain();
        let count = resizes.len();
        for (element, size) in resizes {
            let logical = mapper.size_to_logical(size);
            match element {
                ElementId::EffectBox => self.store.set_effect_size(logical),
                ElementId::Block(block) => {
                    if let Err(err) = self.store.set_width_override(block, Some(logical.width())) {
                        warn!(element:% = element, err:%; "Dropping resize for missing block");
                    }
                }
                other => trace!(element:% = other; "Ignoring resize of non-resizable element"),
            }
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use float_cmp::assert_approx_eq;

    use fishbone_core::geometry::Bounds;

    use super::*;
    use crate::{
        measure::{ResizeHub, StaticMeasurements},
        projection::point_at,
    };

    fn measurements_for(store: &ModelStore, surface: Bounds) -> StaticMeasurements {
        let mapper = CoordinateMapper::new(Size::new(1200.0, 720.0), surface).unwrap();
        StaticMeasurements::synthesize(store, &mapper)
    }

    fn full_surface() -> Bounds {
        Bounds::new_from_top_left(Point::default(), Size::new(1200.0, 720.0))
    }

    #[derive(Default)]
    struct CountingPanels {
        rebuilds: Rc<RefCell<usize>>,
    }

    impl PanelSurface for CountingPanels {
        fn rebuild(&mut self, _store: &ModelStore) {
            *self.rebuilds.borrow_mut() += 1;
        }
    }

    #[test]
    fn test_no_surface_no_layout() {
        let mut editor = DiagramEditor::default();
        let empty = StaticMeasurements::new();
        assert!(editor.layout(&empty).is_none());
        assert!(editor.current_layout().is_none());
    }

    #[test]
    fn test_structural_edit_defers_geometry() {
        let mut editor = DiagramEditor::default();
        let rebuilds = Rc::new(RefCell::new(0));
        editor.set_panels(Box::new(CountingPanels {
            rebuilds: Rc::clone(&rebuilds),
        }));
        let measurements = measurements_for(editor.store(), full_surface());
        editor.on_paint(&measurements);
        let blocks_before = editor.current_layout().unwrap().block_positions().len();

        let category = editor.store().categories()[0].id();
        editor.insert_block(category, None).unwrap();

        assert_eq!(*rebuilds.borrow(), 2);
        assert_eq!(editor.pending(), Some(Invalidation::Structure));
        assert_eq!(
            editor.current_layout().unwrap().block_positions().len(),
            blocks_before
        );

        let measurements = measurements_for(editor.store(), full_surface());
        let layout = editor.on_paint(&measurements).unwrap();
        assert_eq!(layout.block_positions().len(), blocks_before + 1);
        assert!(editor.last_pass().unwrap().rebuilt_bones);
        assert_eq!(editor.pending(), None);
    }

    #[test]
    fn test_appearance_edit_recomputes_immediately() {
        let mut editor = DiagramEditor::default();
        let measurements = measurements_for(editor.store(), full_surface());
        editor.layout(&measurements);

        let layout = editor
            .edit_appearance(&measurements, |a| a.set_bone_slant(60.0))
            .unwrap();
        let first = &layout.bone_paths()[0];
        assert_approx_eq!(f32, first.segment().end().x(), 248.0);
        assert_eq!(editor.pending(), None);
    }

    #[test]
    fn test_resize_changes_placement_not_t() {
        let mut editor = DiagramEditor::default();
        let hub = Rc::new(RefCell::new(ResizeHub::new()));
        editor.subscribe_resizes(hub.clone());

        let measurements = measurements_for(editor.store(), full_surface());
        editor.on_paint(&measurements);
        let ts: Vec<f32> = editor.store().blocks().map(|(_, b)| b.t()).collect();

        let resized = editor.store().categories()[1].blocks()[0].id();
        hub.borrow_mut()
            .notify(ElementId::Block(resized), Size::new(300.0, 80.0));
        hub.borrow_mut()
            .notify(ElementId::Block(resized), Size::new(280.0, 80.0));
        assert_eq!(editor.pending(), Some(Invalidation::Resize));

        let layout = editor.on_paint(&measurements).unwrap();
        assert_approx_eq!(
            f32,
            layout.block(resized).unwrap().bounds().width(),
            280.0,
            epsilon = 1e-3
        );
        let report = editor.last_pass().unwrap();
        assert!(!report.rebuilt_bones);
        assert_eq!(report.applied_resizes, 1);

        let after: Vec<f32> = editor.store().blocks().map(|(_, b)| b.t()).collect();
        assert_eq!(ts, after);
    }

    #[test]
    fn test_inserted_block_receives_resizes() {
        let mut editor = DiagramEditor::default();
        let hub = Rc::new(RefCell::new(ResizeHub::new()));
        editor.subscribe_resizes(hub.clone());

        let category = editor.store().categories()[0].id();
        let added = editor.insert_block(category, None).unwrap();
        let measurements = measurements_for(editor.store(), full_surface());
        editor.on_paint(&measurements);

        let delivered = hub
            .borrow_mut()
            .notify(ElementId::Block(added), Size::new(300.0, 80.0));
        assert_eq!(delivered, 1);
        editor.on_paint(&measurements);
        let width = editor.store().block(added).unwrap().width_override();
        assert_approx_eq!(f32, width.unwrap(), 300.0, epsilon = 1e-3);
    }

    #[test]
    fn test_imported_blocks_receive_resizes() {
        let mut editor = DiagramEditor::default();
        let hub = Rc::new(RefCell::new(ResizeHub::new()));
        editor.subscribe_resizes(hub.clone());

        editor
            .import_json(r#"{"version": 1, "categories": [{"blocks": [{"id": "imported"}]}]}"#)
            .unwrap();
        let imported = ElementId::Block(Id::new("imported"));
        assert!(hub.borrow().is_subscribed(&imported));
        assert_eq!(
            hub.borrow_mut().notify(ElementId::EffectBox, Size::new(200.0, 100.0)),
            1
        );
    }

    #[test]
    fn test_skipped_bone_is_built_on_next_paint() {
        let mut editor = DiagramEditor::default();
        let skipped = editor.store().categories()[2].id();
        let full = measurements_for(editor.store(), full_surface());
        let mut partial = full.clone();
        partial.remove(&ElementId::CategoryRegion(skipped));

        editor.on_paint(&partial);
        assert_eq!(editor.bones().len(), 5);
        assert!(editor.pending().is_some_and(Invalidation::rebuilds_bones));

        let layout = editor.on_paint(&full).unwrap();
        assert_eq!(layout.bone_paths().len(), 6);
        assert!(editor.bones().contains_key(&skipped));
        assert_eq!(editor.pending(), None);
    }

    #[test]
    fn test_drag_through_editor() {
        let mut editor = DiagramEditor::default();
        let surface = Bounds::new_from_top_left(Point::new(50.0, 30.0), Size::new(600.0, 360.0));
        let measurements = measurements_for(editor.store(), surface);
        editor.layout(&measurements);

        let category = editor.store().categories()[3].id();
        let block = editor.store().categories()[3].blocks()[0].id();
        editor.set_t(block, 0.4).unwrap();
        let bone = editor.bones()[&category].segment();
        let mapper = *editor.mapper().unwrap();

        editor
            .on_drag_start(block, mapper.to_rendered(point_at(bone, 0.4)))
            .unwrap();
        let layout = editor
            .on_drag_move(&measurements, mapper.to_rendered(point_at(bone, 0.6)))
            .unwrap()
            .unwrap();
        let attachment = layout.block(block).unwrap().attachment();
        let expected = point_at(bone, 0.6);
        assert_approx_eq!(f32, attachment.x(), expected.x(), epsilon = 0.01);
        assert_approx_eq!(f32, attachment.y(), expected.y(), epsilon = 0.01);

        assert!(editor.on_drag_end().is_some());
        assert_approx_eq!(f32, editor.get_t(block).unwrap(), 0.6, epsilon = 1e-4);
    }

    #[test]
    fn test_remove_dragged_block_clears_drag() {
        let mut editor = DiagramEditor::default();
        let measurements = measurements_for(editor.store(), full_surface());
        editor.layout(&measurements);

        let category = editor.store().categories()[0].id();
        let added = editor.insert_block(category, None).unwrap();
        let measurements = measurements_for(editor.store(), full_surface());
        editor.on_paint(&measurements);

        editor.on_drag_start(added, Point::new(300.0, 300.0)).unwrap();
        editor.remove_block(added).unwrap();
        assert_eq!(editor.drag_state(), DragState::Idle);
    }

    #[test]
    fn test_drag_before_layout_is_refused() {
        let mut editor = DiagramEditor::default();
        let block = editor.store().categories()[0].blocks()[0].id();
        let err = editor.on_drag_start(block, Point::default()).unwrap_err();
        assert!(matches!(err, FishboneError::Drag(_)));
    }

    #[test]
    fn test_failed_import_keeps_state() {
        let mut editor = DiagramEditor::default();
        let block = editor.store().categories()[0].blocks()[0].id();
        editor.set_t(block, 0.3).unwrap();
        let before = editor.store().clone();

        assert!(editor.import_json(r#"{"version": 1}"#).is_err());
        assert!(editor.import_json("nonsense").is_err());
        assert_eq!(editor.store(), &before);
    }

    #[test]
    fn test_import_replaces_model_and_schedules_structure() {
        let mut editor = DiagramEditor::default();
        let measurements = measurements_for(editor.store(), full_surface());
        editor.layout(&measurements);

        editor
            .import_json(r#"{"version": 1, "effectText": "Scrap rate", "categories": []}"#)
            .unwrap();
        assert_eq!(editor.store().effect().text(), "Scrap rate");
        assert_eq!(editor.pending(), Some(Invalidation::Structure));
        assert!(editor.bones().is_empty());
    }

    #[test]
    fn test_layout_twice_is_identical() {
        let mut editor = DiagramEditor::default();
        let measurements = measurements_for(editor.store(), full_surface());

        let first = serde_json::to_string(editor.layout(&measurements).unwrap()).unwrap();
        let second = serde_json::to_string(editor.layout(&measurements).unwrap()).unwrap();
        assert_eq!(first, second);
    }
}
