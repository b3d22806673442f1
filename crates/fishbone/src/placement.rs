//! Placement of ribs, heading blocks, labels and the effect box.
//!
//! [`PlacementEngine::layout`] turns bones plus the stored block parameters
//! into a [`DiagramLayout`] in logical units. Nothing is placed from a
//! measured position: measurements only contribute element heights, so the
//! output is a pure function of the model, the bones and the measured sizes.
//!
//! Around a block's attachment point `A` on its bone:
//!
//! ```text
//!   ┌──────────────┐
//!   │ title        │ gutter  rib_length   6
//!   │ • bullet     │<----><-------------><-->
//!   │ • bullet     │      ───────────────    A
//!   └──────────────┘
//! ```

use indexmap::IndexMap;
use log::debug;
use serde::Serialize;

use fishbone_core::{
    geometry::{Bounds, Point, Segment, Size},
    identifier::Id,
};

use crate::{
    bones::{Bone, SpineGeometry},
    mapper::CoordinateMapper,
    measure::{ElementId, LayoutMeasurementProvider},
    model::{Appearance, ModelStore, Side, clamp_t},
    projection::point_at,
};

/// Gap between a rib's right end and the attachment point.
const RIB_GAP: f32 = 6.0;
/// Gap between a block's right edge and the rib's left end.
const BLOCK_GUTTER: f32 = 4.0;
/// Upward bias so the title row sits above the rib.
const TITLE_LIFT: f32 = 10.0;
/// Gap between a label and its bone's edge point.
const LABEL_GAP: f32 = 4.0;
/// Gap between the arrow tip and the effect box.
const EFFECT_GAP: f32 = 12.0;
/// Line height as a multiple of the font size.
const LINE_HEIGHT: f32 = 1.6;
/// Vertical padding inside a block.
const BLOCK_PADDING: f32 = 12.0;

/// Label height used when the label element has not been measured.
pub fn label_fallback_height(appearance: &Appearance) -> f32 {
    appearance.font_size() * LINE_HEIGHT
}

/// Block height used when the block element has not been measured: one title
/// row plus one row per bullet.
pub fn estimate_block_height(appearance: &Appearance, bullets: usize) -> f32 {
    appearance.font_size() * LINE_HEIGHT * (bullets.max(1) + 1) as f32 + BLOCK_PADDING
}

/// Placement of one heading block.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockPlacement {
    category: Id,
    block: Id,
    attachment: Point,
    rib: Segment,
    bounds: Bounds,
}

impl BlockPlacement {
    pub fn category(&self) -> Id {
        self.category
    }

    pub fn block(&self) -> Id {
        self.block
    }

    /// The point on the bone at the block's parameter.
    pub fn attachment(&self) -> Point {
        self.attachment
    }

    /// The horizontal rib ending just short of the attachment point.
    pub fn rib(&self) -> Segment {
        self.rib
    }

    /// The block rectangle.
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    fn map(&self, mapper: &CoordinateMapper) -> Self {
        Self {
            attachment: mapper.to_rendered(self.attachment),
            rib: self.rib.map(|p| mapper.to_rendered(p)),
            bounds: mapper.bounds_to_rendered(self.bounds),
            ..self.clone()
        }
    }
}

/// Placement of a category label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelPlacement {
    category: Id,
    side: Side,
    bounds: Bounds,
}

impl LabelPlacement {
    pub fn category(&self) -> Id {
        self.category
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }
}

/// A drawn bone.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BonePath {
    category: Id,
    side: Side,
    segment: Segment,
}

impl BonePath {
    pub fn category(&self) -> Id {
        self.category
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn segment(&self) -> Segment {
        self.segment
    }
}

/// Output of one placement pass.
///
/// A `DiagramLayout` produced by [`PlacementEngine::layout`] is in logical
/// units; [`DiagramLayout::to_rendered`] maps it onto the measured surface.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagramLayout {
    canvas: Size,
    spine: Segment,
    arrow_head: [Point; 3],
    bones: Vec<BonePath>,
    labels: Vec<LabelPlacement>,
    blocks: Vec<BlockPlacement>,
    effect: Bounds,
}

impl DiagramLayout {
    /// Size of the coordinate space the layout is expressed in.
    pub fn canvas(&self) -> Size {
        self.canvas
    }

    pub fn spine(&self) -> Segment {
        self.spine
    }

    /// Tip followed by the two base corners.
    pub fn arrow_head(&self) -> [Point; 3] {
        self.arrow_head
    }

    pub fn bone_paths(&self) -> &[BonePath] {
        &self.bones
    }

    pub fn label_positions(&self) -> &[LabelPlacement] {
        &self.labels
    }

    pub fn block_positions(&self) -> &[BlockPlacement] {
        &self.blocks
    }

    pub fn rib_paths(&self) -> impl Iterator<Item = (Id, Segment)> + '_ {
        self.blocks.iter().map(|b| (b.block, b.rib))
    }

    pub fn effect(&self) -> Bounds {
        self.effect
    }

    pub fn block(&self, id: Id) -> Option<&BlockPlacement> {
        self.blocks.iter().find(|b| b.block == id)
    }

    pub fn label(&self, category: Id) -> Option<&LabelPlacement> {
        self.labels.iter().find(|l| l.category == category)
    }

    /// Maps every position onto the surface described by `mapper`.
    pub fn to_rendered(&self, mapper: &CoordinateMapper) -> RenderedLayout {
        let point = |p: Point| mapper.to_rendered(p);
        let layout = Self {
            canvas: mapper.surface().to_size(),
            spine: self.spine.map(point),
            arrow_head: self.arrow_head.map(point),
            bones: self
                .bones
                .iter()
                .map(|bone| BonePath {
                    segment: bone.segment.map(point),
                    ..bone.clone()
                })
                .collect(),
            labels: self
                .labels
                .iter()
                .map(|label| LabelPlacement {
                    bounds: mapper.bounds_to_rendered(label.bounds),
                    ..label.clone()
                })
                .collect(),
            blocks: self.blocks.iter().map(|b| b.map(mapper)).collect(),
            effect: mapper.bounds_to_rendered(self.effect),
        };
        RenderedLayout {
            surface: mapper.surface(),
            layout,
        }
    }
}

/// A [`DiagramLayout`] expressed in absolute surface pixels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedLayout {
    surface: Bounds,
    layout: DiagramLayout,
}

impl RenderedLayout {
    /// The surface rectangle the layout was mapped onto.
    pub fn surface(&self) -> Bounds {
        self.surface
    }

    /// The pixel-space layout.
    pub fn layout(&self) -> &DiagramLayout {
        &self.layout
    }
}

/// Computes attachment points, ribs, block rectangles and labels.
#[derive(Debug)]
pub struct PlacementEngine<'a> {
    mapper: &'a CoordinateMapper,
    appearance: &'a Appearance,
}

impl<'a> PlacementEngine<'a> {
    pub fn new(mapper: &'a CoordinateMapper, appearance: &'a Appearance) -> Self {
        Self { mapper, appearance }
    }

    /// Places every element of `store` whose category has a bone.
    ///
    /// Categories missing from `bones` contribute nothing to this pass.
    pub fn layout(
        &self,
        store: &ModelStore,
        bones: &IndexMap<Id, Bone>,
        measurements: &dyn LayoutMeasurementProvider,
    ) -> DiagramLayout {
        let logical = self.mapper.logical_size();
        let canvas = self.mapper.logical_bounds();
        let spine = SpineGeometry::new(logical, self.appearance);

        let mut layout = DiagramLayout {
            canvas: logical,
            spine: spine.segment(),
            arrow_head: spine.arrow_head(),
            bones: Vec::with_capacity(bones.len()),
            labels: Vec::with_capacity(bones.len()),
            blocks: Vec::new(),
            effect: self.place_effect(store, spine, canvas),
        };

        for category in store.categories() {
            let Some(bone) = bones.get(&category.id()) else {
                continue;
            };

            layout.bones.push(BonePath {
                category: category.id(),
                side: bone.side(),
                segment: bone.segment(),
            });
            layout
                .labels
                .push(self.place_label(category.id(), bone, measurements, canvas));

            for block in category.blocks() {
                let attachment = point_at(bone.segment(), clamp_t(block.t()));
                let width = block
                    .width_override()
                    .unwrap_or(self.appearance.block_width());
                let height = self
                    .measured_size(measurements, ElementId::Block(block.id()))
                    .map(|size| size.height())
                    .unwrap_or_else(|| {
                        estimate_block_height(self.appearance, block.bullets().len())
                    });

                let (rib, bounds) = self.place_block(attachment, Size::new(width, height), canvas);
                layout.blocks.push(BlockPlacement {
                    category: category.id(),
                    block: block.id(),
                    attachment,
                    rib,
                    bounds,
                });
            }
        }

        debug!(
            bones = layout.bones.len(),
            blocks = layout.blocks.len();
            "Placement computed"
        );
        layout
    }

    fn place_block(&self, attachment: Point, size: Size, canvas: Bounds) -> (Segment, Bounds) {
        let rib_end = attachment.with_x(attachment.x() - RIB_GAP);
        let rib_start = rib_end.with_x(rib_end.x() - self.appearance.rib_length());
        let rib = Segment::new(rib_start, rib_end);

        let top_left = Point::new(
            rib_start.x() - BLOCK_GUTTER - size.width(),
            attachment.y() - size.height() / 2.0 - TITLE_LIFT,
        );
        let bounds = Bounds::new_from_top_left(top_left, size).clamp_within(canvas);
        (rib, bounds)
    }

    fn place_label(
        &self,
        category: Id,
        bone: &Bone,
        measurements: &dyn LayoutMeasurementProvider,
        canvas: Bounds,
    ) -> LabelPlacement {
        let height = self
            .measured_size(measurements, ElementId::CategoryLabel(category))
            .map(|size| size.height())
            .unwrap_or_else(|| label_fallback_height(self.appearance));
        let size = Size::new(self.appearance.label_width(), height);

        let edge = bone.edge();
        let top = match bone.side() {
            Side::Upper => edge.y() - LABEL_GAP - height,
            Side::Lower => edge.y() + LABEL_GAP,
        };
        let bounds = Bounds::new_from_top_left(Point::new(edge.x() - size.width() / 2.0, top), size)
            .clamp_within(canvas);

        LabelPlacement {
            category,
            side: bone.side(),
            bounds,
        }
    }

    fn place_effect(&self, store: &ModelStore, spine: SpineGeometry, canvas: Bounds) -> Bounds {
        let effect = store.effect();
        let size = effect.size();
        let top_left = Point::new(
            spine.tip().x() + EFFECT_GAP,
            spine.tip().y() - size.height() / 2.0,
        );
        Bounds::new_from_top_left(top_left, size)
            .translate(effect.offset())
            .clamp_within(canvas)
    }

    /// The measured logical size of `element`, if it has a usable one.
    fn measured_size(
        &self,
        measurements: &dyn LayoutMeasurementProvider,
        element: ElementId,
    ) -> Option<Size> {
        measurements
            .measure(&element)
            .map(|rect| self.mapper.size_to_logical(rect.to_size()))
            .filter(|size| !size.is_empty())
    }
}
