//! Deferral and coalescing of layout work.
//!
//! Mutations mark the scheduler with an [`Invalidation`]; several marks
//! before the next paint merge into the strongest one. Size-change
//! notifications go into a [`ResizeQueue`] shared with the resize callbacks,
//! which keeps only the latest size per element.

use std::{cell::RefCell, rc::Rc};

use indexmap::IndexMap;
use log::trace;

use fishbone_core::geometry::Size;

use crate::measure::{ElementId, ResizeCallback};

/// The kind of work a mutation requires.
///
/// Variants are ordered from weakest to strongest; a stronger kind implies
/// all the work of the weaker ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Invalidation {
    /// An element was resized: placement only, cached bones are reused.
    Resize,
    /// Appearance changed: bones and placement, no panel rebuild.
    Appearance,
    /// Structure or text changed: panels, then bones and placement after the next paint.
    Structure,
}

impl Invalidation {
    /// Whether this kind needs bones to be rebuilt.
    pub fn rebuilds_bones(self) -> bool {
        self >= Invalidation::Appearance
    }
}

/// Latest pending pixel size per element, shared with resize callbacks.
#[derive(Debug, Clone, Default)]
pub struct ResizeQueue {
    pending: Rc<RefCell<IndexMap<ElementId, Size>>>,
}

impl ResizeQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `size` for `element`, replacing any earlier pending size.
    pub fn push(&self, element: ElementId, size: Size) {
        trace!(element:% = element, size:?; "Resize queued");
        self.pending.borrow_mut().insert(element, size);
    }

    /// Takes every pending size in arrival order of the elements.
    pub fn drain(&self) -> Vec<(ElementId, Size)> {
        self.pending.borrow_mut().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.pending.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.borrow().is_empty()
    }

    /// A callback that feeds notifications for `element` into this queue.
    pub fn callback(&self, element: ElementId) -> ResizeCallback {
        let queue = self.clone();
        Box::new(move |size| queue.push(element, size))
    }
}

/// Tracks the pending invalidation and queued resizes.
#[derive(Debug, Default)]
pub struct RenderScheduler {
    pending: Option<Invalidation>,
    resizes: ResizeQueue,
}

impl RenderScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks work of `kind`, merged with whatever is already pending.
    pub fn invalidate(&mut self, kind: Invalidation) {
        self.pending = Some(self.pending.map_or(kind, |current| current.max(kind)));
    }

    /// The work the next paint will do, including queued resizes.
    pub fn pending(&self) -> Option<Invalidation> {
        let resize = (!self.resizes.is_empty()).then_some(Invalidation::Resize);
        self.pending.max(resize)
    }

    /// Takes the pending work, leaving the scheduler clean.
    ///
    /// Queued resizes are not drained; see [`RenderScheduler::resize_queue`].
    pub fn take(&mut self) -> Option<Invalidation> {
        let pending = self.pending();
        self.pending = None;
        pending
    }

    pub fn resize_queue(&self) -> &ResizeQueue {
        &self.resizes
    }
}

#[cfg(test)]
mod tests {
    use fishbone_core::identifier::Id;

    use super::*;

    #[test]
    fn test_strongest_invalidation_wins() {
        let mut scheduler = RenderScheduler::new();
        scheduler.invalidate(Invalidation::Resize);
        scheduler.invalidate(Invalidation::Structure);
        scheduler.invalidate(Invalidation::Appearance);

        assert_eq!(scheduler.take(), Some(Invalidation::Structure));
        assert_eq!(scheduler.take(), None);
    }

    #[test]
    fn test_queued_resize_marks_pending() {
        let mut scheduler = RenderScheduler::new();
        assert_eq!(scheduler.pending(), None);

        let callback_queue = scheduler.resize_queue().clone();
        let mut callback = callback_queue.callback(ElementId::EffectBox);
        callback(Size::new(200.0, 100.0));

        assert_eq!(scheduler.pending(), Some(Invalidation::Resize));
        assert_eq!(scheduler.take(), Some(Invalidation::Resize));
    }

    #[test]
    fn test_resizes_are_coalesced() {
        let queue = ResizeQueue::new();
        let block = ElementId::Block(Id::new("block-1"));

        queue.push(block, Size::new(200.0, 80.0));
        queue.push(ElementId::EffectBox, Size::new(180.0, 90.0));
        queue.push(block, Size::new(260.0, 80.0));

        assert_eq!(queue.len(), 2);
        let drained = queue.drain();
        assert_eq!(
            drained,
            vec![
                (block, Size::new(260.0, 80.0)),
                (ElementId::EffectBox, Size::new(180.0, 90.0)),
            ]
        );
        assert!(queue.is_empty());
    }

    #[test]
    fn test_rebuilds_bones() {
        assert!(!Invalidation::Resize.rebuilds_bones());
        assert!(Invalidation::Appearance.rebuilds_bones());
        assert!(Invalidation::Structure.rebuilds_bones());
    }
}
