//! Interactive drag of heading blocks along their bones.
//!
//! The drag state is an explicit value: [`DragState::Idle`] or
//! [`DragState::Dragging`] with the session that captured the pointer. The
//! controller only ever writes `t` through the [`ModelStore`], where it is
//! clamped; the projected values it works with stay unclamped.

use indexmap::IndexMap;
use log::{debug, trace};
use thiserror::Error;

use fishbone_core::{geometry::Point, identifier::Id};

use crate::{
    bones::Bone,
    error::FishboneError,
    model::ModelStore,
    projection::project_t,
};

/// Reasons a drag cannot start.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DragError {
    #[error("block `{0}` is already being dragged")]
    AlreadyDragging(Id),

    #[error("unknown block `{0}`")]
    UnknownBlock(Id),

    #[error("category `{0}` has no bone in the current layout")]
    BoneUnavailable(Id),
}

/// An active drag of one block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSession {
    category: Id,
    block: Id,
    t_offset: f32,
}

impl DragSession {
    pub fn category(&self) -> Id {
        self.category
    }

    pub fn block(&self) -> Id {
        self.block
    }

    /// Stored `t` minus the projected `t` of the press point.
    pub fn t_offset(&self) -> f32 {
        self.t_offset
    }
}

/// The drag state machine.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging(DragSession),
}

/// Owns the [`DragState`] and applies pointer input to the model.
#[derive(Debug, Default)]
pub struct DragController {
    state: DragState,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging(_))
    }

    /// Starts dragging `block` from the logical point `press`.
    ///
    /// The grab offset keeps the block where it is under the pointer instead
    /// of snapping its attachment point to the press location.
    ///
    /// # Errors
    ///
    /// Fails while another session is active, for an unknown block, or when
    /// the block's category has no bone in this pass. The state is unchanged
    /// on failure.
    pub fn begin(
        &mut self,
        store: &ModelStore,
        bones: &IndexMap<Id, Bone>,
        block: Id,
        press: Point,
    ) -> Result<DragSession, DragError> {
        if let DragState::Dragging(active) = self.state {
            return Err(DragError::AlreadyDragging(active.block));
        }

        let category = store
            .category_of(block)
            .ok_or(DragError::UnknownBlock(block))?;
        let bone = bones
            .get(&category.id())
            .ok_or(DragError::BoneUnavailable(category.id()))?;
        let current_t = store.get_t(block).ok_or(DragError::UnknownBlock(block))?;

        let grab_t = project_t(press, bone.segment());
        let session = DragSession {
            category: category.id(),
            block,
            t_offset: current_t - grab_t,
        };

        debug!(block:% = block, current_t:?, grab_t:?; "Drag started");
        self.state = DragState::Dragging(session);
        Ok(session)
    }

    /// Applies a pointer move at the logical point `pointer`.
    ///
    /// Returns the stored `t`, or `None` when idle or when the dragged
    /// category has no bone in this pass (the move is dropped).
    pub fn update(
        &mut self,
        store: &mut ModelStore,
        bones: &IndexMap<Id, Bone>,
        pointer: Point,
    ) -> Result<Option<f32>, FishboneError> {
        let DragState::Dragging(session) = self.state else {
            return Ok(None);
        };
        let Some(bone) = bones.get(&session.category) else {
            return Ok(None);
        };

        let t = project_t(pointer, bone.segment()) + session.t_offset;
        let stored = store.set_t(session.block, t)?;
        trace!(block:% = session.block, t:?, stored:?; "Drag moved");
        Ok(Some(stored))
    }

    /// Ends the session on pointer release. The last written `t` stands.
    pub fn end(&mut self) -> Option<DragSession> {
        self.finish("Drag ended")
    }

    /// Ends the session on cancellation. The last written `t` stands.
    pub fn cancel(&mut self) -> Option<DragSession> {
        self.finish("Drag cancelled")
    }

    /// Clears the session if it belongs to `block`, which is being deleted.
    pub fn release_block(&mut self, block: Id) -> bool {
        match self.state {
            DragState::Dragging(session) if session.block == block => {
                self.finish("Drag released for deleted block");
                true
            }
            _ => false,
        }
    }

    fn finish(&mut self, message: &str) -> Option<DragSession> {
        match std::mem::take(&mut self.state) {
            DragState::Dragging(session) => {
                debug!(block:% = session.block; "{message}");
                Some(session)
            }
            DragState::Idle => None,
        }
    }
}


#[cfg(test)]
mod proptest_tests {
    use float_cmp::approx_eq;
    use proptest::prelude::*;

    use fishbone_core::geometry::{Bounds, Size};

    use super::*;
    use crate::{
        bones::BoneGeometryBuilder,
        mapper::CoordinateMapper,
        measure::StaticMeasurements,
        model::{T_MAX, T_MIN, clamp_t},
        projection::point_at,
    };

    // ===================
    // Property Test Functions
    // ===================

    /// Dragging by a bone-parameter delta moves the stored `t` by the same
    /// delta, up to clamping.
    fn check_drag_moves_by_delta(
        slot: usize,
        start_t: f32,
        grab_t: f32,
        delta: f32,
    ) -> Result<(), TestCaseError> {
        let mut store = ModelStore::default();
        let logical = Size::new(1200.0, 720.0);
        let mapper =
            CoordinateMapper::new(logical, Bounds::new_from_top_left(Point::default(), logical))
                .ok_or_else(|| TestCaseError::fail("surface should be usable"))?;
        let measurements = StaticMeasurements::synthesize(&store, &mapper);
        let bones = BoneGeometryBuilder::new(logical, store.appearance())
            .build(store.categories(), &measurements);

        let category = store.categories()[slot].id();
        let block = store.categories()[slot].blocks()[0].id();
        let start = store
            .set_t(block, start_t)
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        let bone = bones[&category].segment();

        let mut drag = DragController::new();
        drag.begin(&store, &bones, block, point_at(bone, grab_t))
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        let stored = drag
            .update(&mut store, &bones, point_at(bone, grab_t + delta))
            .map_err(|e| TestCaseError::fail(e.to_string()))?
            .ok_or_else(|| TestCaseError::fail("update should write"))?;

        prop_assert!(approx_eq!(f32, stored, clamp_t(start + delta), epsilon = 1e-3));
        prop_assert!((T_MIN..=T_MAX).contains(&stored));
        Ok(())
    }

    // ===================
    // Proptest Wrappers
    // ===================

    proptest! {
        #[test]
        fn drag_moves_by_delta(
            slot in 0usize..6,
            start_t in 0.08f32..=0.92,
            grab_t in 0.0f32..=1.0,
            delta in -1.5f32..1.5,
        ) {
            check_drag_moves_by_delta(slot, start_t, grab_t, delta)?;
        }
    }
}
