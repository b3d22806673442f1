//! Bone geometry.
//!
//! A bone is the ray a category's headings slide along: a segment from an
//! anchor on the spine to an edge point near the top or bottom of the canvas.
//! Bones are never stored. [`BoneGeometryBuilder`] derives them from scratch
//! on every pass from the category order, the appearance and the canvas size.
//!
//! ```text
//!        edge          edge          edge         (y = 60)
//!          \             \             \
//!           \             \             \
//!   ─────────A─────────────A─────────────A──────▶ tip   (y = H / 2)
//!   start   /             /             /
//!          /             /             /
//!        edge          edge          edge         (y = H - 60)
//! ```
//!
//! Anchors are evenly spaced along the spine band, one per category on each
//! side, in declared order. The measured region of a category only decides
//! whether its bone exists this pass, never where it is.

use indexmap::IndexMap;
use log::{debug, warn};
use serde::Serialize;

use fishbone_core::{
    geometry::{Bounds, Point, Segment, Size},
    identifier::Id,
};

use crate::{
    measure::{ElementId, LayoutMeasurementProvider},
    model::{Appearance, Category, Side},
};

/// X position where the spine starts.
const SPINE_START_X: f32 = 40.0;
/// Distance between the arrow tip and the right edge of the canvas.
const TIP_INSET: f32 = 220.0;
/// Gap between the spine start and the first possible anchor.
const BAND_LEFT_MARGIN: f32 = 60.0;
/// Gap between the last possible anchor and the arrow base.
const BAND_RIGHT_MARGIN: f32 = 20.0;
/// Vertical distance between a bone's edge point and the canvas border.
const EDGE_INSET_Y: f32 = 60.0;
/// Smallest horizontal distance between an anchor and its edge point.
pub const MIN_BONE_SLANT: f32 = 20.0;

/// A derived category bone in logical units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bone {
    spine: Point,
    edge: Point,
    side: Side,
}

impl Bone {
    pub fn new(spine: Point, edge: Point, side: Side) -> Self {
        Self { spine, edge, side }
    }

    /// Where the bone meets the spine (`t = 0`).
    pub fn spine(&self) -> Point {
        self.spine
    }

    /// The outer end of the bone where the label sits (`t = 1`).
    pub fn edge(&self) -> Point {
        self.edge
    }

    pub fn side(&self) -> Side {
        self.side
    }

    /// The bone as a segment from spine to edge.
    pub fn segment(&self) -> Segment {
        Segment::new(self.spine, self.edge)
    }
}

/// Fixed spine and arrow geometry for a canvas and appearance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpineGeometry {
    start: Point,
    tip: Point,
    arrow_width: f32,
}

impl SpineGeometry {
    pub fn new(logical: Size, appearance: &Appearance) -> Self {
        let y = logical.height() / 2.0;
        Self {
            start: Point::new(SPINE_START_X, y),
            tip: Point::new(logical.width() - TIP_INSET, y),
            arrow_width: appearance.arrow_width(),
        }
    }

    pub fn start(&self) -> Point {
        self.start
    }

    /// The point of the arrow head.
    pub fn tip(&self) -> Point {
        self.tip
    }

    /// Where the arrow head begins, `arrow_width` before the tip.
    pub fn arrow_base(&self) -> Point {
        self.tip.with_x(self.tip.x() - self.arrow_width)
    }

    /// The spine line from its start up to the arrow base.
    pub fn segment(&self) -> Segment {
        Segment::new(self.start, self.arrow_base())
    }

    /// Tip followed by the two base corners of the arrow head.
    pub fn arrow_head(&self) -> [Point; 3] {
        let base = self.arrow_base();
        let half = self.arrow_width / 2.0;
        [
            self.tip,
            base.with_y(base.y() - half),
            base.with_y(base.y() + half),
        ]
    }

    /// Horizontal range available for bone anchors.
    pub fn anchor_band(&self) -> (f32, f32) {
        (
            self.start.x() + BAND_LEFT_MARGIN,
            self.arrow_base().x() - BAND_RIGHT_MARGIN,
        )
    }

    /// X position of anchor `index` out of `count` evenly spaced anchors.
    pub fn anchor_x(&self, index: usize, count: usize) -> f32 {
        let (left, right) = self.anchor_band();
        let span = right - left;
        left + span * (index + 1) as f32 / (count + 1) as f32
    }
}

/// Computes one bone per measurable category.
#[derive(Debug)]
pub struct BoneGeometryBuilder<'a> {
    logical: Size,
    appearance: &'a Appearance,
}

impl<'a> BoneGeometryBuilder<'a> {
    pub fn new(logical: Size, appearance: &'a Appearance) -> Self {
        Self {
            logical,
            appearance,
        }
    }

    pub fn spine(&self) -> SpineGeometry {
        SpineGeometry::new(self.logical, self.appearance)
    }

    /// Builds the bones of `categories`, keyed by category id in declared order.
    ///
    /// A category whose region cannot be measured (absent or with an empty
    /// rectangle) is left out; callers retry on the next pass.
    pub fn build(
        &self,
        categories: &[Category],
        measurements: &dyn LayoutMeasurementProvider,
    ) -> IndexMap<Id, Bone> {
        let spine = self.spine();
        let canvas = Bounds::new_from_top_left(Point::default(), self.logical);
        let slant = self.appearance.bone_slant().max(MIN_BONE_SLANT);

        let side_count = |side: Side| categories.iter().filter(|c| c.side() == side).count();
        let counts = [side_count(Side::Upper), side_count(Side::Lower)];
        let mut seen = [0usize; 2];

        let mut bones = IndexMap::with_capacity(categories.len());
        for category in categories {
            let (row, edge_y) = match category.side() {
                Side::Upper => (0, EDGE_INSET_Y),
                Side::Lower => (1, self.logical.height() - EDGE_INSET_Y),
            };
            let index = seen[row];
            seen[row] += 1;

            if !is_measurable(measurements, category.id()) {
                warn!(category:% = category.id(); "Category region not measurable, skipping bone");
                continue;
            }

            let anchor = Point::new(spine.anchor_x(index, counts[row]), spine.start().y());
            let edge = clamp_point(Point::new(anchor.x() - slant, edge_y), canvas);
            bones.insert(category.id(), Bone::new(anchor, edge, category.side()));
        }

        debug!(bones = bones.len(), slant:?; "Bones built");
        bones
    }
}

fn is_measurable(measurements: &dyn LayoutMeasurementProvider, category: Id) -> bool {
    measurements
        .measure(&ElementId::CategoryRegion(category))
        .is_some_and(|rect| !rect.to_size().is_empty())
}

fn clamp_point(point: Point, canvas: Bounds) -> Point {
    Point::new(
        point.x().clamp(canvas.min_x(), canvas.max_x()),
        point.y().clamp(canvas.min_y(), canvas.max_y()),
    )
}
