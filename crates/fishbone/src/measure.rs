//! Measurement and resize collaborator interfaces.
//!
//! The geometry engine never talks to a rendering surface directly. It pulls
//! element rectangles through a [`LayoutMeasurementProvider`] once per layout
//! pass and receives interactive size changes through a [`ResizeSource`]
//! subscription. Both can be backed by in-memory data, which is what
//! [`StaticMeasurements`] and [`ResizeHub`] provide.

use std::fmt;

use indexmap::IndexMap;

use fishbone_core::{
    geometry::{Bounds, Point, Size},
    identifier::Id,
};

use crate::{
    mapper::CoordinateMapper,
    model::{ModelStore, Side},
    placement,
};

/// An element of the editing surface that can be measured or resized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementId {
    /// The whole diagram surface.
    Surface,
    /// The editable region of a category.
    CategoryRegion(Id),
    /// The label element of a category.
    CategoryLabel(Id),
    /// A heading block.
    Block(Id),
    /// The effect box at the arrow tip.
    EffectBox,
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Surface => write!(f, "surface"),
            Self::CategoryRegion(id) => write!(f, "region:{id}"),
            Self::CategoryLabel(id) => write!(f, "label:{id}"),
            Self::Block(id) => write!(f, "block:{id}"),
            Self::EffectBox => write!(f, "effect"),
        }
    }
}

/// Pull-based access to the current on-screen rectangles, in pixels.
pub trait LayoutMeasurementProvider {
    /// Returns the rectangle of `element`, or `None` if it is not laid out.
    fn measure(&self, element: &ElementId) -> Option<Bounds>;
}

/// Callback receiving the new pixel size of a resized element.
pub type ResizeCallback = Box<dyn FnMut(Size)>;

/// Subscription interface for interactive size changes.
pub trait ResizeSource {
    /// Registers `callback` to be called whenever `element` changes size.
    fn on_resize(&mut self, element: ElementId, callback: ResizeCallback);
}

/// The layer that owns the editable panels for categories and blocks.
pub trait PanelSurface {
    /// Rebuilds the editable panels so they reflect `store`.
    fn rebuild(&mut self, store: &ModelStore);
}

/// In-memory measurements keyed by element.
///
/// # Examples
///
/// ```
/// use fishbone::measure::{ElementId, LayoutMeasurementProvider, StaticMeasurements};
/// use fishbone_core::geometry::{Bounds, Point, Size};
///
/// let surface = Bounds::new_from_top_left(Point::default(), Size::new(1200.0, 720.0));
/// let measurements = StaticMeasurements::new().with(ElementId::Surface, surface);
///
/// assert_eq!(measurements.measure(&ElementId::Surface), Some(surface));
/// assert_eq!(measurements.measure(&ElementId::EffectBox), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StaticMeasurements {
    rects: IndexMap<ElementId, Bounds>,
}

impl StaticMeasurements {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a measurement (builder style).
    pub fn with(mut self, element: ElementId, bounds: Bounds) -> Self {
        self.insert(element, bounds);
        self
    }

    pub fn insert(&mut self, element: ElementId, bounds: Bounds) {
        self.rects.insert(element, bounds);
    }

    pub fn remove(&mut self, element: &ElementId) -> Option<Bounds> {
        self.rects.shift_remove(element)
    }

    pub fn len(&self) -> usize {
        self.rects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    /// Fabricates a plausible set of measurements for `store` on the surface
    /// described by `mapper`.
    ///
    /// Category regions are laid out as a three-column grid, upper categories
    /// in the top half of the surface and lower categories in the bottom half.
    /// Labels and blocks receive the heights the placement engine would
    /// estimate for them.
    pub fn synthesize(store: &ModelStore, mapper: &CoordinateMapper) -> Self {
        let logical = mapper.logical_size();
        let appearance = store.appearance();
        let mut measurements = Self::new().with(ElementId::Surface, mapper.surface());

        let column_width = logical.width() / 3.0;
        let row_height = logical.height() / 2.0;
        let mut columns = [0usize; 2];

        for category in store.categories() {
            let row = match category.side() {
                Side::Upper => 0,
                Side::Lower => 1,
            };
            let column = columns[row];
            columns[row] += 1;

            let region = Bounds::new_from_top_left(
                Point::new(column as f32 * column_width, row as f32 * row_height),
                Size::new(column_width, row_height),
            );
            measurements.insert(
                ElementId::CategoryRegion(category.id()),
                mapper.bounds_to_rendered(region),
            );

            let label = Bounds::new_from_top_left(
                region.min_point(),
                Size::new(
                    appearance.label_width(),
                    placement::label_fallback_height(appearance),
                ),
            );
            measurements.insert(
                ElementId::CategoryLabel(category.id()),
                mapper.bounds_to_rendered(label),
            );

            for block in category.blocks() {
                let size = Size::new(
                    block.width_override().unwrap_or(appearance.block_width()),
                    placement::estimate_block_height(appearance, block.bullets().len()),
                );
                let rect = Bounds::new_from_top_left(region.min_point(), size);
                measurements.insert(ElementId::Block(block.id()), mapper.bounds_to_rendered(rect));
            }
        }

        let effect = Bounds::new_from_top_left(Point::default(), store.effect().size());
        measurements.insert(ElementId::EffectBox, mapper.bounds_to_rendered(effect));

        measurements
    }
}

impl LayoutMeasurementProvider for StaticMeasurements {
    fn measure(&self, element: &ElementId) -> Option<Bounds> {
        self.rects.get(element).copied()
    }
}

/// A [`ResizeSource`] that stores callbacks and dispatches notifications to them.
///
/// # Examples
///
/// ```
/// use std::{cell::Cell, rc::Rc};
///
/// use fishbone::measure::{ElementId, ResizeHub, ResizeSource};
/// use fishbone_core::geometry::Size;
///
/// let seen = Rc::new(Cell::new(0.0));
/// let mut hub = ResizeHub::new();
///
/// let sink = Rc::clone(&seen);
/// hub.on_resize(ElementId::EffectBox, Box::new(move |size| sink.set(size.width())));
///
/// assert_eq!(hub.notify(ElementId::EffectBox, Size::new(240.0, 100.0)), 1);
/// assert_eq!(seen.get(), 240.0);
/// ```
#[derive(Default)]
pub struct ResizeHub {
    listeners: IndexMap<ElementId, Vec<ResizeCallback>>,
}

impl ResizeHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivers `size` to every callback registered for `element`.
    ///
    /// Returns the number of callbacks invoked.
    pub fn notify(&mut self, element: ElementId, size: Size) -> usize {
        self.listeners
            .get_mut(&element)
            .map(|callbacks| {
                callbacks.iter_mut().for_each(|callback| callback(size));
                callbacks.len()
            })
            .unwrap_or_default()
    }

    /// Drops every callback registered for `element`.
    pub fn unsubscribe(&mut self, element: &ElementId) {
        self.listeners.shift_remove(element);
    }

    pub fn is_subscribed(&self, element: &ElementId) -> bool {
        self.listeners
            .get(element)
            .is_some_and(|callbacks| !callbacks.is_empty())
    }
}

impl fmt::Debug for ResizeHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResizeHub")
            .field("elements", &self.listeners.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ResizeSource for ResizeHub {
    fn on_resize(&mut self, element: ElementId, callback: ResizeCallback) {
        self.listeners.entry(element).or_default().push(callback);
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::*;

    fn mapper() -> CoordinateMapper {
        let surface = Bounds::new_from_top_left(Point::new(0.0, 0.0), Size::new(600.0, 360.0));
        CoordinateMapper::new(Size::new(1200.0, 720.0), surface).unwrap()
    }

    #[test]
    fn test_synthesize_covers_every_element() {
        let store = ModelStore::default();
        let measurements = StaticMeasurements::synthesize(&store, &mapper());

        assert!(measurements.measure(&ElementId::Surface).is_some());
        assert!(measurements.measure(&ElementId::EffectBox).is_some());
        for (category, block) in store.blocks() {
            assert!(
                measurements
                    .measure(&ElementId::CategoryRegion(category.id()))
                    .is_some()
            );
            assert!(
                measurements
                    .measure(&ElementId::CategoryLabel(category.id()))
                    .is_some()
            );
            assert!(measurements.measure(&ElementId::Block(block.id())).is_some());
        }
    }

    #[test]
    fn test_synthesize_regions_are_in_pixels() {
        let store = ModelStore::default();
        let measurements = StaticMeasurements::synthesize(&store, &mapper());
        let first = store.categories()[0].id();

        let region = measurements
            .measure(&ElementId::CategoryRegion(first))
            .unwrap();
        assert_eq!(region.to_size(), Size::new(200.0, 180.0));
    }

    #[test]
    fn test_remove_measurement() {
        let mut measurements = StaticMeasurements::new().with(
            ElementId::EffectBox,
            Bounds::new_from_top_left(Point::default(), Size::new(10.0, 10.0)),
        );
        assert_eq!(measurements.len(), 1);
        assert!(measurements.remove(&ElementId::EffectBox).is_some());
        assert!(measurements.is_empty());
    }

    #[test]
    fn test_hub_dispatches_only_to_subscribers() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut hub = ResizeHub::new();
        let block = ElementId::Block(Id::new("block-1"));

        let sink = Rc::clone(&log);
        hub.on_resize(block, Box::new(move |size| sink.borrow_mut().push(size)));

        assert_eq!(hub.notify(ElementId::EffectBox, Size::new(1.0, 1.0)), 0);
        assert_eq!(hub.notify(block, Size::new(300.0, 90.0)), 1);
        assert_eq!(log.borrow().as_slice(), &[Size::new(300.0, 90.0)]);

        hub.unsubscribe(&block);
        assert!(!hub.is_subscribed(&block));
        assert_eq!(hub.notify(block, Size::new(1.0, 1.0)), 0);
    }

    #[test]
    fn test_element_id_display() {
        assert_eq!(ElementId::Block(Id::new("block-3")).to_string(), "block:block-3");
        assert_eq!(ElementId::Surface.to_string(), "surface");
    }
}
