use crate::dom::{Document, NodeId};
use crate::style::{parse_number, StyleMap};

const DEFAULT_FONT_SIZE: &str = "14px";
const DEFAULT_FONT_SIZE_PX: f32 = 14.0;
const DEFAULT_FILL: &str = "#000000";
const DEFAULT_FONT_FAMILY: &str = "Helvetica, Arial, sans-serif";
const DEFAULT_FONT_WEIGHT: &str = "bold";

/// Offset from the box's top padding to the first line's visual center, as a
/// fraction of the font size. Tuned to draw.io's HTML label layout.
pub const BASELINE_FACTOR: f32 = 0.35;
/// Per-line advance for the second and later lines of a multi-line label,
/// as a fraction of the font size.
pub const LINE_HEIGHT: f32 = 1.2;

/// Anchor point and font properties resolved for one label container.
#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub x: f32,
    pub y: f32,
    /// Font size as written in the source, unit included.
    pub font_size: String,
    pub font_size_px: f32,
    pub fill: String,
    pub font_family: String,
    pub font_weight: String,
}

/// Folds the style attributes of every element in the container's subtree
/// (container included, document order) into one effective style.
pub fn effective_style(doc: &Document, container: NodeId) -> StyleMap {
    let mut style = StyleMap::default();
    for id in doc.descendants(container) {
        if let Some(attr) = doc.get(id).attr("style") {
            style.apply(attr);
        }
    }
    style
}

/// Derives the text anchor and font metrics for a container.
///
/// The x anchor is the horizontal center of the original HTML box, matching
/// a "middle" text-anchor; the y anchor approximates where the first line's
/// baseline falls below the box's top padding.
pub fn resolve_geometry(doc: &Document, container: NodeId) -> TextStyle {
    let style = effective_style(doc, container);

    let margin_left = numeric(style.margin_left.as_deref());
    let padding_top = numeric(style.padding_top.as_deref());
    let width = numeric(style.width.as_deref());

    let font_size = style
        .font_size
        .unwrap_or_else(|| DEFAULT_FONT_SIZE.to_string());
    let font_size_px = parse_number(&font_size, DEFAULT_FONT_SIZE_PX);

    TextStyle {
        x: margin_left + width / 2.0,
        y: padding_top + font_size_px * BASELINE_FACTOR,
        font_size,
        font_size_px,
        fill: style.color.unwrap_or_else(|| DEFAULT_FILL.to_string()),
        font_family: style
            .font_family
            .unwrap_or_else(|| DEFAULT_FONT_FAMILY.to_string()),
        font_weight: style
            .font_weight
            .unwrap_or_else(|| DEFAULT_FONT_WEIGHT.to_string()),
    }
}

fn numeric(value: Option<&str>) -> f32 {
    value.map(|v| parse_number(v, 0.0)).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;

    fn foreign_object(doc: &Document) -> NodeId {
        doc.descendants(doc.root())
            .into_iter()
            .find(|&id| doc.get(id).local_name() == "foreignObject")
            .expect("fixture has a foreignObject")
    }

    #[test]
    fn defaults_apply_without_any_style() {
        let doc = Document::parse(
            r#"<svg><foreignObject><div>Hi</div></foreignObject></svg>"#,
        )
        .unwrap();
        let style = resolve_geometry(&doc, foreign_object(&doc));

        assert_eq!(style.x, 0.0);
        assert_eq!(style.y, DEFAULT_FONT_SIZE_PX * BASELINE_FACTOR);
        assert_eq!(style.font_size, "14px");
        assert_eq!(style.font_size_px, 14.0);
        assert_eq!(style.fill, "#000000");
        assert_eq!(style.font_family, "Helvetica, Arial, sans-serif");
        assert_eq!(style.font_weight, "bold");
    }

    #[test]
    fn anchor_derives_from_box_layout() {
        let doc = Document::parse(
            r#"<svg><foreignObject><div style="margin-left:40px;width:20px;padding-top:5px;font-size:16px">Hi</div></foreignObject></svg>"#,
        )
        .unwrap();
        let style = resolve_geometry(&doc, foreign_object(&doc));

        assert_eq!(style.x, 50.0);
        assert_eq!(style.y, 5.0 + 16.0 * BASELINE_FACTOR);
        assert_eq!(style.font_size, "16px");
        assert_eq!(style.font_size_px, 16.0);
    }

    #[test]
    fn later_descendant_wins_per_property() {
        let doc = Document::parse(
            r#"<svg><foreignObject style="margin-left:10px;color:#111111"><div style="margin-left:40px"><span style="font-weight:normal"/></div></foreignObject></svg>"#,
        )
        .unwrap();
        let style = resolve_geometry(&doc, foreign_object(&doc));

        assert_eq!(style.x, 40.0);
        assert_eq!(style.fill, "#111111");
        assert_eq!(style.font_weight, "normal");
    }

    #[test]
    fn zeroed_font_size_in_subtree_is_ignored() {
        let doc = Document::parse(
            r#"<svg><foreignObject><div style="font-size:16px"><div style="font-size:0px">x</div></div></foreignObject></svg>"#,
        )
        .unwrap();
        let style = resolve_geometry(&doc, foreign_object(&doc));

        assert_eq!(style.font_size, "16px");
        assert_eq!(style.font_size_px, 16.0);
    }

    #[test]
    fn unparsable_font_size_keeps_raw_string_and_default_px() {
        let doc = Document::parse(
            r#"<svg><foreignObject><div style="font-size:large">x</div></foreignObject></svg>"#,
        )
        .unwrap();
        let style = resolve_geometry(&doc, foreign_object(&doc));

        assert_eq!(style.font_size, "large");
        assert_eq!(style.font_size_px, DEFAULT_FONT_SIZE_PX);
    }
}
