//! SVG preview of a computed layout.
//!
//! The preview is drawn in logical units: the document's `viewBox` is the
//! logical canvas, so the output scales to any size without re-running layout.

use std::{fs::File, io::Write};

use log::{debug, error, info};
use svg::{
    Document,
    node::{Text as SvgText, element as svg_element},
};

use fishbone_core::{
    apply_stroke,
    color::Color,
    geometry::{Bounds, Point, Segment},
    stroke::{StrokeCap, StrokeDefinition},
};

use crate::{
    error::FishboneError,
    export::Exporter,
    model::{Appearance, ModelStore},
    placement::DiagramLayout,
};

const FONT_FAMILY: &str = "sans-serif";
const TEXT_PADDING: f32 = 6.0;

/// SVG exporter writing to a file.
#[derive(Debug, Clone)]
pub struct Svg {
    file_name: String,
}

impl Svg {
    pub fn new(file_name: &str) -> Self {
        Self {
            file_name: file_name.to_string(),
        }
    }

    /// Renders `layout` as an SVG document.
    pub fn render_document(store: &ModelStore, layout: &DiagramLayout) -> Document {
        let appearance = store.appearance();
        let canvas = layout.canvas();
        let bone = StrokeDefinition::solid(appearance.bone_color(), appearance.bone_thickness())
            .with_cap(StrokeCap::Round);
        let rib = StrokeDefinition::solid(
            appearance.bone_color(),
            (appearance.bone_thickness() * 0.6).max(1.0),
        );
        let outline = StrokeDefinition::dashed(appearance.bone_color().with_alpha(0.4), 1.0);

        let mut doc = Document::new()
            .set(
                "viewBox",
                format!("0 0 {} {}", canvas.width(), canvas.height()),
            )
            .set("width", canvas.width())
            .set("height", canvas.height())
            .add(
                svg_element::Rectangle::new()
                    .set("width", canvas.width())
                    .set("height", canvas.height())
                    .set("fill", "white"),
            );

        doc = doc.add(line(layout.spine(), &bone));
        doc = doc.add(arrow_head(layout.arrow_head(), appearance.bone_color()));

        for path in layout.bone_paths() {
            doc = doc.add(line(path.segment(), &bone));
        }
        for (_, segment) in layout.rib_paths() {
            doc = doc.add(line(segment, &rib));
        }

        for label in layout.label_positions() {
            let text = store
                .category(label.category())
                .map(|category| category.label())
                .unwrap_or_default();
            doc = doc.add(centered_text(label.bounds(), &[text], appearance));
        }

        for placement in layout.block_positions() {
            let Some(block) = store.block(placement.block()) else {
                continue;
            };
            doc = doc.add(rectangle(placement.bounds(), &outline));
            doc = doc.add(block_text(
                placement.bounds(),
                block.title(),
                block.bullets(),
                appearance,
            ));
        }

        let effect = layout.effect();
        doc = doc.add(rectangle(effect, &bone));
        let lines: Vec<&str> = store.effect().text().lines().collect();
        doc = doc.add(centered_text(effect, &lines, appearance));

        debug!(
            blocks = layout.block_positions().len(),
            labels = layout.label_positions().len();
            "SVG preview rendered"
        );
        doc
    }

    /// Writes an SVG document to the configured file.
    pub fn write_document(&self, doc: Document) -> Result<(), FishboneError> {
        info!(file_name = self.file_name; "Creating SVG file");
        let mut file = File::create(&self.file_name).inspect_err(|err| {
            error!(file_name = self.file_name, err:%; "Failed to create SVG file");
        })?;

        write!(file, "{doc}").inspect_err(|err| {
            error!(file_name = self.file_name, err:%; "Failed to write SVG content");
        })?;
        Ok(())
    }
}

impl Exporter for Svg {
    fn export_layout(&self, store: &ModelStore, layout: &DiagramLayout) -> Result<(), FishboneError> {
        let doc = Self::render_document(store, layout);
        self.write_document(doc)
    }
}

fn line(segment: Segment, stroke: &StrokeDefinition) -> svg_element::Line {
    let element = svg_element::Line::new()
        .set("x1", segment.start().x())
        .set("y1", segment.start().y())
        .set("x2", segment.end().x())
        .set("y2", segment.end().y());
    apply_stroke!(element, stroke)
}

fn arrow_head(points: [Point; 3], color: Color) -> svg_element::Polygon {
    let points = points
        .iter()
        .map(|p| format!("{},{}", p.x(), p.y()))
        .collect::<Vec<_>>()
        .join(" ");
    svg_element::Polygon::new()
        .set("points", points)
        .set("fill", &color)
        .set("fill-opacity", color.alpha())
}

fn rectangle(bounds: Bounds, stroke: &StrokeDefinition) -> svg_element::Rectangle {
    let element = svg_element::Rectangle::new()
        .set("x", bounds.min_x())
        .set("y", bounds.min_y())
        .set("width", bounds.width())
        .set("height", bounds.height())
        .set("fill", "white")
        .set("rx", 3.0);
    apply_stroke!(element, stroke)
}

fn centered_text(bounds: Bounds, lines: &[&str], appearance: &Appearance) -> svg_element::Text {
    let center = bounds.center();
    let line_height = appearance.font_size() * 1.2;
    let first_dy = -line_height * (lines.len().max(1) - 1) as f32 / 2.0;

    let mut text = svg_element::Text::new("")
        .set("x", center.x())
        .set("y", center.y())
        .set("text-anchor", "middle")
        .set("dominant-baseline", "central")
        .set("font-family", FONT_FAMILY)
        .set("font-size", appearance.font_size())
        .set("font-weight", "bold");

    for (index, line) in lines.iter().enumerate() {
        let dy = if index == 0 { first_dy } else { line_height };
        text = text.add(
            svg_element::TSpan::new("")
                .set("x", center.x())
                .set("dy", dy)
                .add(SvgText::new(*line)),
        );
    }
    text
}

fn block_text(
    bounds: Bounds,
    title: &str,
    bullets: &[String],
    appearance: &Appearance,
) -> svg_element::Text {
    let x = bounds.min_x() + TEXT_PADDING;
    let line_height = appearance.font_size() * 1.6;

    let mut text = svg_element::Text::new("")
        .set("x", x)
        .set("y", bounds.min_y() + TEXT_PADDING)
        .set("dominant-baseline", "hanging")
        .set("font-family", FONT_FAMILY)
        .set("font-size", appearance.font_size());

    text = text.add(
        svg_element::TSpan::new("")
            .set("x", x)
            .set("font-weight", "bold")
            .add(SvgText::new(title)),
    );
    for bullet in bullets {
        text = text.add(
            svg_element::TSpan::new("")
                .set("x", x)
                .set("dy", line_height)
                .add(SvgText::new(format!("\u{2022} {bullet}"))),
        );
    }
    text
}
