use crate::dom::{Child, Document, Element, NodeId};
use crate::geometry::{TextStyle, LINE_HEIGHT};

/// Builds the native `<text>` element replacing one foreignObject label.
///
/// Multi-line text becomes one `<tspan>` per line sharing the anchor x; a
/// tspan's `dy` is relative to the previous line, so every line after the
/// first advances exactly one line height. Single-line text is stored
/// directly as the element's text.
pub fn build_label_node(doc: &mut Document, id: &str, style: &TextStyle, text: &str) -> NodeId {
    let x = format!("{:.2}", style.x);
    let y = format!("{:.2}", style.y);

    let mut node = Element::new("text");
    node.set_attr("id", id);
    node.set_attr("x", &x);
    node.set_attr("y", &y);
    node.set_attr("font-size", &style.font_size);
    node.set_attr("fill", &style.fill);
    node.set_attr("font-family", &style.font_family);
    node.set_attr("text-anchor", "middle");
    node.set_attr("font-weight", &style.font_weight);

    let lines: Vec<&str> = text.lines().collect();
    if lines.len() <= 1 {
        node.children.push(Child::Text(text.to_string()));
        return doc.alloc(node);
    }

    let node_id = doc.alloc(node);
    for (i, line) in lines.iter().enumerate() {
        let dy = if i == 0 {
            0.0
        } else {
            style.font_size_px * LINE_HEIGHT
        };
        let mut tspan = Element::new("tspan");
        tspan.set_attr("x", &x);
        tspan.set_attr("dy", &format!("{}", dy));
        tspan.children.push(Child::Text((*line).to_string()));
        let tspan_id = doc.alloc(tspan);
        doc.get_mut(node_id).children.push(Child::Element(tspan_id));
    }
    node_id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;
    use crate::geometry::resolve_geometry;

    fn fixture() -> (Document, TextStyle) {
        let doc = Document::parse(
            r#"<svg><foreignObject><div style="margin-left:40px;width:20px;padding-top:5px;font-size:16px">x</div></foreignObject></svg>"#,
        )
        .unwrap();
        let container = doc
            .descendants(doc.root())
            .into_iter()
            .find(|&id| doc.get(id).local_name() == "foreignObject")
            .unwrap();
        let style = resolve_geometry(&doc, container);
        (doc, style)
    }

    #[test]
    fn single_line_label_carries_text_directly() {
        let (mut doc, style) = fixture();
        let id = build_label_node(&mut doc, "cell1", &style, "Hi");
        let node = doc.get(id);

        assert_eq!(node.name, "text");
        assert_eq!(node.attr("id"), Some("cell1"));
        assert_eq!(node.attr("x"), Some("50.00"));
        assert_eq!(node.attr("y"), Some("10.60"));
        assert_eq!(node.attr("font-size"), Some("16px"));
        assert_eq!(node.attr("fill"), Some("#000000"));
        assert_eq!(node.attr("text-anchor"), Some("middle"));
        assert_eq!(node.attr("font-weight"), Some("bold"));
        assert_eq!(node.children, vec![Child::Text("Hi".to_string())]);
    }

    #[test]
    fn attribute_order_is_stable() {
        let (mut doc, style) = fixture();
        let id = build_label_node(&mut doc, "cell1", &style, "Hi");
        let keys: Vec<&str> = doc
            .get(id)
            .attrs
            .iter()
            .map(|(k, _)| k.as_str())
            .collect();
        assert_eq!(
            keys,
            vec![
                "id",
                "x",
                "y",
                "font-size",
                "fill",
                "font-family",
                "text-anchor",
                "font-weight"
            ]
        );
    }

    #[test]
    fn multi_line_label_gets_one_tspan_per_line() {
        let (mut doc, style) = fixture();
        let id = build_label_node(&mut doc, "cell1", &style, "one\ntwo\nthree");

        let tspans: Vec<NodeId> = doc
            .get(id)
            .children
            .iter()
            .filter_map(|c| match c {
                Child::Element(cid) => Some(*cid),
                _ => None,
            })
            .collect();
        assert_eq!(tspans.len(), 3);

        // dy is per line, not cumulative.
        let dys: Vec<&str> = tspans
            .iter()
            .map(|&t| doc.get(t).attr("dy").unwrap())
            .collect();
        assert_eq!(dys, vec!["0", "19.2", "19.2"]);

        for (&t, expected) in tspans.iter().zip(["one", "two", "three"]) {
            assert_eq!(doc.get(t).name, "tspan");
            assert_eq!(doc.get(t).attr("x"), Some("50.00"));
            assert_eq!(doc.text_content(t), expected);
        }
    }

    #[test]
    fn coordinates_are_formatted_to_two_decimals() {
        let (mut doc, mut style) = fixture();
        style.x = 0.0;
        style.y = 4.899999;
        let id = build_label_node(&mut doc, "cell1", &style, "Hi");

        assert_eq!(doc.get(id).attr("x"), Some("0.00"));
        assert_eq!(doc.get(id).attr("y"), Some("4.90"));
    }
}
