//! The persisted diagram document.
//!
//! Documents are JSON with camelCase keys:
//!
//! ```json
//! { "version": 1,
//!   "effectText": "Problem", "effectPos": {"dx": 0, "dy": 0}, "effectSize": {"w": 180, "h": 90},
//!   "appearance": { "boneColor": "#1f2937", "boneThickness": 3, "...": "..." },
//!   "categories": [ { "id": "methods", "side": "upper", "label": "Methods",
//!                     "blocks": [ { "id": "block-1", "title": "Cause", "bullets": [""], "t": 0.5 } ] } ] }
//! ```
//!
//! Import validates the whole document before anything is replaced. Some
//! problems reject the document outright; others are repaired:
//!
//! | Problem | Outcome |
//! |---------|---------|
//! | malformed JSON, missing `categories`, newer `version`, invalid `boneColor` | rejected |
//! | fewer than six categories | padded from the default model |
//! | more than six categories | extra entries dropped |
//! | `side` disagreeing with the slot | slot side wins |
//! | `t` not a finite number | infinities clamp, anything else becomes 0.5 |
//! | empty `blocks` / `bullets` | one default block / one empty bullet |
//! | duplicate or missing ids | fresh ids |
//! | out-of-band sizes and appearance values | clamped |

use std::collections::HashSet;

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use fishbone_core::{
    geometry::{Point, Size},
    identifier::Id,
};

use crate::model::{
    Appearance, Block, CATEGORY_COUNT, Category, DEFAULT_T, EffectBox, ModelStore, Side, T_MAX,
    T_MIN, clamp_t,
};

/// Highest document version this build understands.
pub const SCHEMA_VERSION: u32 = 1;

/// Reasons a document is rejected.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("malformed document: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("document has no `categories` array")]
    MissingCategories,

    #[error("unsupported document version {found} (this build reads up to {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("invalid bone color: {0}")]
    InvalidColor(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct OffsetDoc {
    #[serde(default)]
    dx: f32,
    #[serde(default)]
    dy: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SizeDoc {
    w: f32,
    h: f32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppearanceDoc {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    bone_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    bone_thickness: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    font_size: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    arrow_width: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    label_width: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    rib_length: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    block_width: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    bone_slant: Option<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct BlockDoc {
    #[serde(default)]
    id: Option<Id>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    bullets: Vec<String>,
    /// Kept as a raw value so non-numeric input can be repaired instead of rejected.
    #[serde(default)]
    t: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    width: Option<f32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CategoryDoc {
    #[serde(default)]
    id: Option<Id>,
    #[serde(default)]
    side: Option<Side>,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    blocks: Vec<BlockDoc>,
}

/// The on-disk shape of a diagram.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagramDocument {
    #[serde(default)]
    version: Option<u32>,
    #[serde(default)]
    effect_text: Option<String>,
    #[serde(default)]
    effect_pos: Option<OffsetDoc>,
    #[serde(default)]
    effect_size: Option<SizeDoc>,
    #[serde(default)]
    appearance: Option<AppearanceDoc>,
    #[serde(default)]
    categories: Option<Vec<CategoryDoc>>,
}

impl DiagramDocument {
    /// Parses a document without validating it.
    pub fn parse(json: &str) -> Result<Self, ImportError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Captures the persisted state of `store`.
    pub fn from_store(store: &ModelStore) -> Self {
        let effect = store.effect();
        let appearance = store.appearance();

        Self {
            version: Some(SCHEMA_VERSION),
            effect_text: Some(effect.text().to_string()),
            effect_pos: Some(OffsetDoc {
                dx: effect.offset().x(),
                dy: effect.offset().y(),
            }),
            effect_size: Some(SizeDoc {
                w: effect.size().width(),
                h: effect.size().height(),
            }),
            appearance: Some(AppearanceDoc {
                bone_color: Some(appearance.bone_color().to_string()),
                bone_thickness: Some(appearance.bone_thickness()),
                font_size: Some(appearance.font_size()),
                arrow_width: Some(appearance.arrow_width()),
                label_width: Some(appearance.label_width()),
                rib_length: Some(appearance.rib_length()),
                block_width: Some(appearance.block_width()),
                bone_slant: Some(appearance.bone_slant()),
            }),
            categories: Some(
                store
                    .categories()
                    .iter()
                    .map(|category| CategoryDoc {
                        id: Some(category.id()),
                        side: Some(category.side()),
                        label: Some(category.label().to_string()),
                        blocks: category
                            .blocks()
                            .iter()
                            .map(|block| BlockDoc {
                                id: Some(block.id()),
                                title: block.title().to_string(),
                                bullets: block.bullets().to_vec(),
                                t: Value::from(block.t()),
                                width: block.width_override(),
                            })
                            .collect(),
                    })
                    .collect(),
            ),
        }
    }

    /// Validates the document and builds a model from it.
    ///
    /// # Errors
    ///
    /// Returns an [`ImportError`] for documents that must be rejected; see the
    /// module documentation for what is rejected and what is repaired.
    pub fn into_store(self) -> Result<ModelStore, ImportError> {
        if let Some(found) = self.version.filter(|v| *v > SCHEMA_VERSION) {
            return Err(ImportError::UnsupportedVersion {
                found,
                supported: SCHEMA_VERSION,
            });
        }
        let categories = self.categories.ok_or(ImportError::MissingCategories)?;
        let appearance = build_appearance(self.appearance.unwrap_or_default())?;

        if categories.len() != CATEGORY_COUNT {
            warn!(
                found = categories.len(),
                expected = CATEGORY_COUNT;
                "Document category count differs, padding or truncating"
            );
        }

        let mut ids = IdAllocator::default();
        let mut imported: Vec<Option<CategoryDoc>> = categories.into_iter().map(Some).collect();
        imported.resize_with(CATEGORY_COUNT, || None);

        let categories: Vec<Category> = imported
            .into_iter()
            .enumerate()
            .map(|(slot, doc)| build_category(slot, doc.unwrap_or_default(), &mut ids))
            .collect();

        let effect = EffectBox::new(
            self.effect_text.unwrap_or_else(|| EffectBox::default().text().to_string()),
            self.effect_pos
                .map(|p| Point::new(p.dx, p.dy))
                .unwrap_or_default(),
            self.effect_size
                .map(|s| Size::new(s.w, s.h))
                .unwrap_or_else(|| EffectBox::default().size()),
        );

        debug!(blocks = ids.blocks.len(); "Document imported");
        Ok(ModelStore::from_parts(categories, effect, appearance))
    }

    /// Serializes the document as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Parses, validates and converts a JSON document into a model.
///
/// # Examples
///
/// ```
/// let store = fishbone::document::import_json(r#"{"version": 1, "categories": []}"#).unwrap();
/// assert_eq!(store.categories().len(), 6);
///
/// assert!(fishbone::document::import_json(r#"{"version": 1}"#).is_err());
/// ```
pub fn import_json(json: &str) -> Result<ModelStore, ImportError> {
    DiagramDocument::parse(json)?.into_store()
}

/// Serializes `store` as a JSON document.
pub fn export_json(store: &ModelStore) -> Result<String, serde_json::Error> {
    DiagramDocument::from_store(store).to_json()
}

/// Hands out category and block ids, replacing missing or duplicate ones.
#[derive(Debug, Default)]
struct IdAllocator {
    categories: HashSet<Id>,
    blocks: HashSet<Id>,
    minted: usize,
}

impl IdAllocator {
    fn category(&mut self, slot: usize, requested: Option<Id>) -> Id {
        match requested {
            Some(id) if self.categories.insert(id) => id,
            _ => {
                let id = Category::default_id(slot);
                if self.categories.insert(id) {
                    return id;
                }
                (slot..)
                    .map(|n| Id::numbered("category", n))
                    .find(|id| self.categories.insert(*id))
                    .unwrap_or(id)
            }
        }
    }

    fn block(&mut self, requested: Option<Id>) -> Id {
        match requested {
            Some(id) if self.blocks.insert(id) => id,
            _ => self.fresh_block(),
        }
    }

    fn fresh_block(&mut self) -> Id {
        loop {
            self.minted += 1;
            let id = Id::numbered("block", self.minted);
            if self.blocks.insert(id) {
                return id;
            }
        }
    }
}

fn build_appearance(doc: AppearanceDoc) -> Result<Appearance, ImportError> {
    let mut appearance = Appearance::default();
    if let Some(color) = doc.bone_color {
        appearance
            .set_bone_color(&color)
            .map_err(ImportError::InvalidColor)?;
    }

    let setters: [(Option<f32>, fn(&mut Appearance, f32)); 7] = [
        (doc.bone_thickness, Appearance::set_bone_thickness),
        (doc.font_size, Appearance::set_font_size),
        (doc.arrow_width, Appearance::set_arrow_width),
        (doc.label_width, Appearance::set_label_width),
        (doc.rib_length, Appearance::set_rib_length),
        (doc.block_width, Appearance::set_block_width),
        (doc.bone_slant, Appearance::set_bone_slant),
    ];
    for (value, set) in setters {
        if let Some(value) = value {
            set(&mut appearance, value);
        }
    }
    Ok(appearance)
}

fn build_category(slot: usize, doc: CategoryDoc, ids: &mut IdAllocator) -> Category {
    let id = ids.category(slot, doc.id);
    let side = Side::for_slot(slot);
    if doc.side.is_some_and(|requested| requested != side) {
        warn!(category:% = id, slot:?; "Ignoring side that disagrees with the category slot");
    }

    let mut blocks: Vec<Block> = doc
        .blocks
        .into_iter()
        .map(|block| {
            Block::new(
                ids.block(block.id),
                block.title,
                block.bullets,
                repair_t(&block.t),
            )
            .with_width_override(block.width)
        })
        .collect();
    if blocks.is_empty() {
        blocks.push(Block::default_with_id(ids.fresh_block()));
    }

    let label = doc
        .label
        .unwrap_or_else(|| Category::default_label(slot).to_string());
    Category::new(id, side, label, blocks)
}

/// Turns a raw `t` value into a storable parameter.
///
/// Numbers are clamped; the strings `"Infinity"` and `"-Infinity"` clamp to the
/// nearest bound; anything else becomes [`DEFAULT_T`].
fn repair_t(value: &Value) -> f32 {
    match value {
        Value::Number(number) => number.as_f64().map_or(DEFAULT_T, |t| clamp_t(t as f32)),
        Value::String(text) => match text.trim() {
            "Infinity" | "+Infinity" | "inf" => T_MAX,
            "-Infinity" | "-inf" => T_MIN,
            _ => DEFAULT_T,
        },
        _ => DEFAULT_T,
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;

    fn category_json(id: &str, ts: &[&str]) -> String {
        let blocks: Vec<String> = ts
            .iter()
            .enumerate()
            .map(|(i, t)| format!(r#"{{"id": "{id}-b{i}", "title": "T{i}", "bullets": ["x"], "t": {t}}}"#))
            .collect();
        format!(
            r#"{{"id": "{id}", "side": "upper", "label": "{id}", "blocks": [{}]}}"#,
            blocks.join(",")
        )
    }

    #[test]
    fn test_round_trip_default_store() {
        let store = ModelStore::default();
        let json = export_json(&store).unwrap();
        let back = import_json(&json).unwrap();

        assert_eq!(back.categories(), store.categories());
        assert_eq!(back.effect(), store.effect());

        let (a, b) = (back.appearance(), store.appearance());
        assert_eq!(a.bone_color().to_string(), b.bone_color().to_string());
        assert_approx_eq!(f32, a.bone_slant(), b.bone_slant());
        assert_approx_eq!(f32, a.block_width(), b.block_width());
        assert_approx_eq!(f32, a.font_size(), b.font_size());
    }

    #[test]
    fn test_export_uses_camel_case_keys() {
        let json = export_json(&ModelStore::default()).unwrap();
        assert!(json.contains("\"effectText\""));
        assert!(json.contains("\"effectSize\""));
        assert!(json.contains("\"boneSlant\""));
        assert!(!json.contains("\"width\""));
    }

    #[test]
    fn test_four_categories_are_padded_to_six() {
        let categories: Vec<String> = ["a", "b", "c", "d"]
            .iter()
            .map(|id| category_json(id, &["0.3"]))
            .collect();
        let json = format!(r#"{{"version": 1, "categories": [{}]}}"#, categories.join(","));

        let store = import_json(&json).unwrap();
        assert_eq!(store.categories().len(), 6);
        for (slot, id) in ["a", "b", "c", "d"].iter().enumerate() {
            assert_eq!(store.categories()[slot].id(), *id);
            assert_eq!(store.categories()[slot].label(), *id);
        }
        assert_eq!(store.categories()[4].label(), "Environment");
        assert_eq!(store.categories()[5].label(), "People");
    }

    #[test]
    fn test_sides_follow_slots() {
        let categories: Vec<String> = (0..6).map(|i| category_json(&format!("c{i}"), &["0.5"])).collect();
        let json = format!(r#"{{"categories": [{}]}}"#, categories.join(","));

        let store = import_json(&json).unwrap();
        let sides: Vec<Side> = store.categories().iter().map(|c| c.side()).collect();
        assert_eq!(
            sides,
            vec![Side::Upper, Side::Upper, Side::Upper, Side::Lower, Side::Lower, Side::Lower]
        );
    }

    #[test]
    fn test_extra_categories_are_dropped() {
        let categories: Vec<String> = (0..8).map(|i| category_json(&format!("c{i}"), &["0.5"])).collect();
        let json = format!(r#"{{"categories": [{}]}}"#, categories.join(","));

        let store = import_json(&json).unwrap();
        assert_eq!(store.categories().len(), 6);
        assert!(store.category(Id::new("c6")).is_none());
    }

    #[test]
    fn test_missing_categories_is_rejected() {
        let err = import_json(r#"{"version": 1, "effectText": "x"}"#).unwrap_err();
        assert!(matches!(err, ImportError::MissingCategories));
    }

    #[test]
    fn test_malformed_json_is_rejected() {
        let err = import_json("{not json").unwrap_err();
        assert!(matches!(err, ImportError::Malformed(_)));
    }

    #[test]
    fn test_newer_version_is_rejected() {
        let err = import_json(r#"{"version": 9, "categories": []}"#).unwrap_err();
        assert!(matches!(err, ImportError::UnsupportedVersion { found: 9, .. }));
    }

    #[test]
    fn test_invalid_color_is_rejected() {
        let json = r#"{"categories": [], "appearance": {"boneColor": "blurple-ish"}}"#;
        assert!(matches!(
            import_json(json).unwrap_err(),
            ImportError::InvalidColor(_)
        ));
    }

    #[test]
    fn test_non_finite_t_is_repaired() {
        let json = format!(
            r#"{{"categories": [{}]}}"#,
            category_json("m", &["-5", "5", "null", r#""Infinity""#, r#""-Infinity""#, r#""oops""#])
        );
        let store = import_json(&json).unwrap();
        let ts: Vec<f32> = store.categories()[0].blocks().iter().map(|b| b.t()).collect();

        assert_approx_eq!(f32, ts[0], T_MIN);
        assert_approx_eq!(f32, ts[1], T_MAX);
        assert_approx_eq!(f32, ts[2], DEFAULT_T);
        assert_approx_eq!(f32, ts[3], T_MAX);
        assert_approx_eq!(f32, ts[4], T_MIN);
        assert_approx_eq!(f32, ts[5], DEFAULT_T);
    }

    #[test]
    fn test_empty_blocks_and_bullets_are_filled() {
        let json = r#"{"categories": [
            {"id": "m", "label": "M", "blocks": []},
            {"id": "n", "label": "N", "blocks": [{"id": "x", "title": "X", "bullets": [], "t": 0.4}]}
        ]}"#;
        let store = import_json(json).unwrap();

        assert_eq!(store.categories()[0].blocks().len(), 1);
        assert_eq!(store.categories()[0].blocks()[0].bullets(), &[String::new()]);
        assert_eq!(store.block(Id::new("x")).unwrap().bullets(), &[String::new()]);
    }

    #[test]
    fn test_duplicate_ids_are_replaced() {
        let json = r#"{"categories": [
            {"id": "m", "blocks": [{"id": "dup", "t": 0.3}, {"id": "dup", "t": 0.6}]},
            {"id": "m", "blocks": [{"t": 0.4}]}
        ]}"#;
        let store = import_json(json).unwrap();

        let first = &store.categories()[0];
        assert_ne!(first.blocks()[0].id(), first.blocks()[1].id());
        assert_ne!(store.categories()[0].id(), store.categories()[1].id());

        let mut categories: Vec<String> =
            store.categories().iter().map(|c| c.id().to_string()).collect();
        categories.sort();
        categories.dedup();
        assert_eq!(categories.len(), 6);

        let mut all: Vec<String> = store.blocks().map(|(_, b)| b.id().to_string()).collect();
        let count = all.len();
        all.sort();
        all.dedup();
        assert_eq!(all.len(), count);
    }

    #[test]
    fn test_colliding_fallback_category_id_is_skipped() {
        let json = r#"{"categories": [
            {"id": "materials"}, {"id": "category-2"}, {"id": "materials"}
        ]}"#;
        let store = import_json(json).unwrap();

        let ids: Vec<String> = store.categories().iter().map(|c| c.id().to_string()).collect();
        assert_eq!(ids[0], "materials");
        assert_eq!(ids[1], "category-2");
        assert_ne!(ids[2], "category-2");

        let mut unique = ids.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), ids.len());
    }

    #[test]
    fn test_out_of_band_values_are_clamped() {
        let json = r#"{"categories": [], "effectSize": {"w": 9999, "h": 1},
            "appearance": {"boneSlant": 0, "ribLength": 1000},
            "effectPos": {"dx": 12, "dy": -4}}"#;
        let store = import_json(json).unwrap();

        assert_eq!(store.effect().size(), Size::new(400.0, 40.0));
        assert_eq!(store.effect().offset(), Point::new(12.0, -4.0));
        assert_approx_eq!(f32, store.appearance().bone_slant(), 20.0);
        assert_approx_eq!(f32, store.appearance().rib_length(), 120.0);
    }

    #[test]
    fn test_width_override_round_trips() {
        let mut store = ModelStore::default();
        let block = store.categories()[0].blocks()[0].id();
        store.set_width_override(block, Some(240.0)).unwrap();

        let back = import_json(&export_json(&store).unwrap()).unwrap();
        assert_eq!(back.block(block).unwrap().width_override(), Some(240.0));
    }
}
