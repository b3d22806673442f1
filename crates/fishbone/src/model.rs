//! The editable diagram model.
//!
//! [`ModelStore`] owns the six categories, their heading blocks, the effect
//! box and the appearance parameters. It has no geometry knowledge: a block's
//! position is the single scalar `t` along its category's bone, and every
//! geometric quantity is derived from the store on each layout pass.
//!
//! All writes go through the store so that the value bands hold at the point
//! of write: `t` stays in `[T_MIN, T_MAX]`, sizes stay in their bands, every
//! category keeps at least one block and every block at least one bullet.

use log::debug;

use fishbone_core::{
    color::Color,
    geometry::{Point, Size},
    identifier::Id,
};

use crate::error::FishboneError;

/// Smallest storable block parameter.
pub const T_MIN: f32 = 0.08;
/// Largest storable block parameter.
pub const T_MAX: f32 = 0.92;
/// Parameter given to blocks that have no usable position.
pub const DEFAULT_T: f32 = 0.5;

/// Number of categories in every diagram.
pub const CATEGORY_COUNT: usize = 6;
/// Categories on each side of the spine.
pub const CATEGORIES_PER_SIDE: usize = CATEGORY_COUNT / 2;

/// Distance along the bone between a seed block and a block inserted next to it.
const SIBLING_T_STEP: f32 = 0.12;

const DEFAULT_LABELS: [&str; CATEGORY_COUNT] = [
    "Methods",
    "Machines",
    "Materials",
    "Measurements",
    "Environment",
    "People",
];

/// Clamps a block parameter into `[T_MIN, T_MAX]`.
///
/// A NaN parameter has no meaningful nearest bound and becomes [`DEFAULT_T`].
///
/// # Examples
///
/// ```
/// use fishbone::model::{clamp_t, T_MAX, T_MIN};
///
/// assert_eq!(clamp_t(-5.0), T_MIN);
/// assert_eq!(clamp_t(5.0), T_MAX);
/// assert_eq!(clamp_t(0.4), 0.4);
/// ```
pub fn clamp_t(t: f32) -> f32 {
    if t.is_nan() {
        DEFAULT_T
    } else {
        t.clamp(T_MIN, T_MAX)
    }
}

/// A closed band of valid values with a fallback for NaN input.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Band {
    min: f32,
    max: f32,
    default: f32,
}

impl Band {
    const fn new(min: f32, max: f32, default: f32) -> Self {
        Self { min, max, default }
    }

    pub(crate) fn clamp(self, value: f32) -> f32 {
        if value.is_nan() {
            self.default
        } else {
            value.clamp(self.min, self.max)
        }
    }

    pub(crate) fn default_value(self) -> f32 {
        self.default
    }
}

pub(crate) const BONE_THICKNESS: Band = Band::new(1.0, 12.0, 3.0);
pub(crate) const FONT_SIZE: Band = Band::new(8.0, 32.0, 14.0);
pub(crate) const ARROW_WIDTH: Band = Band::new(12.0, 120.0, 28.0);
pub(crate) const LABEL_WIDTH: Band = Band::new(60.0, 320.0, 150.0);
pub(crate) const RIB_LENGTH: Band = Band::new(10.0, 120.0, 36.0);
pub(crate) const BLOCK_WIDTH: Band = Band::new(80.0, 600.0, 190.0);
/// The lower bound keeps every bone's edge point away from its spine anchor.
pub(crate) const BONE_SLANT: Band = Band::new(20.0, 400.0, 150.0);
pub(crate) const EFFECT_WIDTH: Band = Band::new(80.0, 400.0, 180.0);
pub(crate) const EFFECT_HEIGHT: Band = Band::new(40.0, 300.0, 90.0);
pub(crate) const EFFECT_OFFSET: Band = Band::new(-600.0, 600.0, 0.0);

/// Which side of the spine a category sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Upper,
    Lower,
}

impl Side {
    /// The fixed side of the category in `slot` (first half upper, second half lower).
    pub fn for_slot(slot: usize) -> Self {
        if slot < CATEGORIES_PER_SIDE {
            Side::Upper
        } else {
            Side::Lower
        }
    }
}

/// A heading on a bone with its bullet list.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    id: Id,
    title: String,
    bullets: Vec<String>,
    t: f32,
    width_override: Option<f32>,
}

impl Block {
    pub(crate) fn new(id: Id, title: impl Into<String>, bullets: Vec<String>, t: f32) -> Self {
        Self {
            id,
            title: title.into(),
            bullets: non_empty_bullets(bullets),
            t: clamp_t(t),
            width_override: None,
        }
    }

    pub(crate) fn default_with_id(id: Id) -> Self {
        Self::new(id, "Cause", Vec::new(), DEFAULT_T)
    }

    pub(crate) fn with_width_override(mut self, width: Option<f32>) -> Self {
        self.width_override = width.map(|w| BLOCK_WIDTH.clamp(w));
        self
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn bullets(&self) -> &[String] {
        &self.bullets
    }

    /// Position along the category's bone, in `[T_MIN, T_MAX]`.
    pub fn t(&self) -> f32 {
        self.t
    }

    /// Width set by interactively resizing this block, in logical units.
    pub fn width_override(&self) -> Option<f32> {
        self.width_override
    }
}

fn non_empty_bullets(bullets: Vec<String>) -> Vec<String> {
    if bullets.is_empty() {
        vec![String::new()]
    } else {
        bullets
    }
}

/// One of the six cause categories.
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    id: Id,
    side: Side,
    label: String,
    blocks: Vec<Block>,
}

impl Category {
    pub(crate) fn new(id: Id, side: Side, label: impl Into<String>, blocks: Vec<Block>) -> Self {
        Self {
            id,
            side,
            label: label.into(),
            blocks,
        }
    }

    /// The default category of `slot`, holding one default block with id `block`.
    pub(crate) fn default_for_slot(slot: usize, block: Id) -> Self {
        Self::new(
            Self::default_id(slot),
            Side::for_slot(slot),
            Self::default_label(slot),
            vec![Block::default_with_id(block)],
        )
    }

    /// The identifier the default model gives the category in `slot`.
    pub(crate) fn default_id(slot: usize) -> Id {
        Id::new(&Self::default_label(slot).to_lowercase())
    }

    pub(crate) fn default_label(slot: usize) -> &'static str {
        DEFAULT_LABELS[slot % CATEGORY_COUNT]
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }
}

/// The problem statement sitting at the arrow tip.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectBox {
    text: String,
    offset: Point,
    size: Size,
}

impl EffectBox {
    pub(crate) fn new(text: impl Into<String>, offset: Point, size: Size) -> Self {
        Self {
            text: text.into(),
            offset: clamp_offset(offset),
            size: clamp_effect_size(size),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Displacement from the default position, in logical units.
    pub fn offset(&self) -> Point {
        self.offset
    }

    /// Size in logical units.
    pub fn size(&self) -> Size {
        self.size
    }
}

impl Default for EffectBox {
    fn default() -> Self {
        Self::new(
            "Problem",
            Point::default(),
            Size::new(EFFECT_WIDTH.default_value(), EFFECT_HEIGHT.default_value()),
        )
    }
}

fn clamp_offset(offset: Point) -> Point {
    Point::new(
        EFFECT_OFFSET.clamp(offset.x()),
        EFFECT_OFFSET.clamp(offset.y()),
    )
}

fn clamp_effect_size(size: Size) -> Size {
    Size::new(
        EFFECT_WIDTH.clamp(size.width()),
        EFFECT_HEIGHT.clamp(size.height()),
    )
}

/// Global visual parameters.
///
/// Every numeric setter clamps into the parameter's band, so the geometry
/// code can rely on the values without re-checking them.
#[derive(Debug, Clone, PartialEq)]
pub struct Appearance {
    bone_color: Color,
    bone_thickness: f32,
    font_size: f32,
    arrow_width: f32,
    label_width: f32,
    rib_length: f32,
    block_width: f32,
    bone_slant: f32,
}

impl Default for Appearance {
    fn default() -> Self {
        Self {
            bone_color: Color::new("#1f2937").unwrap_or_default(),
            bone_thickness: BONE_THICKNESS.default_value(),
            font_size: FONT_SIZE.default_value(),
            arrow_width: ARROW_WIDTH.default_value(),
            label_width: LABEL_WIDTH.default_value(),
            rib_length: RIB_LENGTH.default_value(),
            block_width: BLOCK_WIDTH.default_value(),
            bone_slant: BONE_SLANT.default_value(),
        }
    }
}

impl Appearance {
    pub fn bone_color(&self) -> Color {
        self.bone_color
    }

    pub fn bone_thickness(&self) -> f32 {
        self.bone_thickness
    }

    pub fn font_size(&self) -> f32 {
        self.font_size
    }

    pub fn arrow_width(&self) -> f32 {
        self.arrow_width
    }

    pub fn label_width(&self) -> f32 {
        self.label_width
    }

    pub fn rib_length(&self) -> f32 {
        self.rib_length
    }

    pub fn block_width(&self) -> f32 {
        self.block_width
    }

    pub fn bone_slant(&self) -> f32 {
        self.bone_slant
    }

    /// Sets the bone color from a CSS color string.
    ///
    /// # Errors
    ///
    /// Returns the parse message if the string is not a valid CSS color; the
    /// current color is kept.
    pub fn set_bone_color(&mut self, color: &str) -> Result<(), String> {
        self.bone_color = Color::new(color)?;
        Ok(())
    }

    pub fn set_bone_thickness(&mut self, value: f32) {
        self.bone_thickness = BONE_THICKNESS.clamp(value);
    }

    pub fn set_font_size(&mut self, value: f32) {
        self.font_size = FONT_SIZE.clamp(value);
    }

    pub fn set_arrow_width(&mut self, value: f32) {
        self.arrow_width = ARROW_WIDTH.clamp(value);
    }

    pub fn set_label_width(&mut self, value: f32) {
        self.label_width = LABEL_WIDTH.clamp(value);
    }

    pub fn set_rib_length(&mut self, value: f32) {
        self.rib_length = RIB_LENGTH.clamp(value);
    }

    pub fn set_block_width(&mut self, value: f32) {
        self.block_width = BLOCK_WIDTH.clamp(value);
    }

    pub fn set_bone_slant(&mut self, value: f32) {
        self.bone_slant = BONE_SLANT.clamp(value);
    }
}

/// The single live diagram model.
///
/// Components receive the store by reference; the [`DiagramEditor`](crate::DiagramEditor)
/// is the one place that mutates it in response to events and schedules the
/// matching layout work.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelStore {
    categories: Vec<Category>,
    effect: EffectBox,
    appearance: Appearance,
    minted_blocks: usize,
}

impl Default for ModelStore {
    fn default() -> Self {
        Self::new(Appearance::default())
    }
}

impl ModelStore {
    /// Creates the default six-category model with the given appearance.
    pub fn new(appearance: Appearance) -> Self {
        let mut store = Self {
            categories: Vec::with_capacity(CATEGORY_COUNT),
            effect: EffectBox::default(),
            appearance,
            minted_blocks: 0,
        };
        for slot in 0..CATEGORY_COUNT {
            let block = store.mint_block_id();
            store
                .categories
                .push(Category::default_for_slot(slot, block));
        }
        store
    }

    /// Assembles a store from already validated parts.
    ///
    /// `categories` must hold exactly [`CATEGORY_COUNT`] entries in slot order.
    pub(crate) fn from_parts(
        categories: Vec<Category>,
        effect: EffectBox,
        appearance: Appearance,
    ) -> Self {
        debug_assert_eq!(categories.len(), CATEGORY_COUNT);
        Self {
            categories,
            effect,
            appearance,
            minted_blocks: 0,
        }
    }

    /// Returns an identifier of the form `block-N` not used by any block yet.
    pub(crate) fn mint_block_id(&mut self) -> Id {
        loop {
            self.minted_blocks += 1;
            let id = Id::numbered("block", self.minted_blocks);
            if self.block(id).is_none() {
                return id;
            }
        }
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn category(&self, id: Id) -> Option<&Category> {
        self.categories.iter().find(|category| category.id == id)
    }

    /// Returns the category that owns `block`.
    pub fn category_of(&self, block: Id) -> Option<&Category> {
        self.categories
            .iter()
            .find(|category| category.blocks.iter().any(|b| b.id == block))
    }

    pub fn block(&self, id: Id) -> Option<&Block> {
        self.blocks().map(|(_, block)| block).find(|b| b.id == id)
    }

    /// Iterates every block together with its category, in display order.
    pub fn blocks(&self) -> impl Iterator<Item = (&Category, &Block)> {
        self.categories
            .iter()
            .flat_map(|category| category.blocks.iter().map(move |block| (category, block)))
    }

    pub fn effect(&self) -> &EffectBox {
        &self.effect
    }

    pub fn appearance(&self) -> &Appearance {
        &self.appearance
    }

    pub fn appearance_mut(&mut self) -> &mut Appearance {
        &mut self.appearance
    }

    /// Returns the stored parameter of `block`.
    pub fn get_t(&self, block: Id) -> Option<f32> {
        self.block(block).map(Block::t)
    }

    /// Writes the parameter of `block`, clamped into `[T_MIN, T_MAX]`.
    ///
    /// Returns the value actually stored.
    ///
    /// # Errors
    ///
    /// Returns [`FishboneError::UnknownBlock`] if no block has this id.
    pub fn set_t(&mut self, block: Id, t: f32) -> Result<f32, FishboneError> {
        let target = self.block_mut(block)?;
        target.t = clamp_t(t);
        Ok(target.t)
    }

    /// Sets or clears the interactive width of `block`, in logical units.
    pub fn set_width_override(
        &mut self,
        block: Id,
        width: Option<f32>,
    ) -> Result<(), FishboneError> {
        let target = self.block_mut(block)?;
        target.width_override = width.map(|w| BLOCK_WIDTH.clamp(w));
        Ok(())
    }

    pub fn set_label(&mut self, category: Id, label: impl Into<String>) -> Result<(), FishboneError> {
        self.category_mut(category)?.label = label.into();
        Ok(())
    }

    pub fn set_title(&mut self, block: Id, title: impl Into<String>) -> Result<(), FishboneError> {
        self.block_mut(block)?.title = title.into();
        Ok(())
    }

    /// Replaces the bullets of `block`. An empty list stores a single empty bullet.
    pub fn set_bullets(&mut self, block: Id, bullets: Vec<String>) -> Result<(), FishboneError> {
        self.block_mut(block)?.bullets = non_empty_bullets(bullets);
        Ok(())
    }

    pub fn set_effect_text(&mut self, text: impl Into<String>) {
        self.effect.text = text.into();
    }

    pub fn set_effect_offset(&mut self, offset: Point) {
        self.effect.offset = clamp_offset(offset);
    }

    pub fn set_effect_size(&mut self, size: Size) {
        self.effect.size = clamp_effect_size(size);
    }

    /// Inserts a new heading into `category`.
    ///
    /// The block goes directly after `near` (or at the end when `near` is
    /// `None`) and is seeded with a parameter one step further out along the
    /// bone than that sibling, or one step back when the step would leave the
    /// band.
    ///
    /// # Errors
    ///
    /// Returns an error if the category is unknown or `near` is not one of its blocks.
    pub fn insert_block(&mut self, category: Id, near: Option<Id>) -> Result<Id, FishboneError> {
        let id = self.mint_block_id();
        let target = self.category_mut(category)?;

        let index = match near {
            Some(sibling) => target
                .blocks
                .iter()
                .position(|b| b.id == sibling)
                .ok_or(FishboneError::UnknownBlock(sibling))?,
            None => target.blocks.len() - 1,
        };

        let seed = target.blocks.get(index).map_or(DEFAULT_T, Block::t);
        let t = if seed + SIBLING_T_STEP <= T_MAX {
            seed + SIBLING_T_STEP
        } else {
            seed - SIBLING_T_STEP
        };

        target
            .blocks
            .insert(index + 1, Block::new(id, "New heading", Vec::new(), t));
        debug!(category:% = category, block:% = id, t:?; "Inserted block");
        Ok(id)
    }

    /// Removes a heading and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`FishboneError::LastBlock`] when the block is the only one of
    /// its category, or [`FishboneError::UnknownBlock`] if it does not exist.
    pub fn remove_block(&mut self, block: Id) -> Result<Block, FishboneError> {
        let category = self
            .categories
            .iter_mut()
            .find(|category| category.blocks.iter().any(|b| b.id == block))
            .ok_or(FishboneError::UnknownBlock(block))?;

        if category.blocks.len() == 1 {
            return Err(FishboneError::LastBlock(category.id));
        }

        let index = category
            .blocks
            .iter()
            .position(|b| b.id == block)
            .ok_or(FishboneError::UnknownBlock(block))?;
        debug!(category:% = category.id, block:% = block; "Removed block");
        Ok(category.blocks.remove(index))
    }

    fn category_mut(&mut self, id: Id) -> Result<&mut Category, FishboneError> {
        self.categories
            .iter_mut()
            .find(|category| category.id == id)
            .ok_or(FishboneError::UnknownCategory(id))
    }

    fn block_mut(&mut self, id: Id) -> Result<&mut Block, FishboneError> {
        self.categories
            .iter_mut()
            .flat_map(|category| category.blocks.iter_mut())
            .find(|block| block.id == id)
            .ok_or(FishboneError::UnknownBlock(id))
    }
}
