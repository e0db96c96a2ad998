/// The subset of CSS-ish properties a draw.io label can carry that matters
/// for text placement. Everything else in a style attribute is ignored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleMap {
    pub margin_left: Option<String>,
    pub padding_top: Option<String>,
    pub width: Option<String>,
    pub font_size: Option<String>,
    pub color: Option<String>,
    pub font_family: Option<String>,
    pub font_weight: Option<String>,
}

impl StyleMap {
    /// Folds one semicolon-delimited style string in. Later declarations win
    /// over earlier ones per property, so calling this across a subtree in
    /// document order yields the effective style.
    pub fn apply(&mut self, style: &str) {
        for declaration in style.split(';') {
            let Some((name, value)) = declaration.split_once(':') else {
                continue;
            };
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match name.trim() {
                "margin-left" => self.margin_left = Some(value.to_string()),
                "padding-top" => self.padding_top = Some(value.to_string()),
                "width" => self.width = Some(value.to_string()),
                // A zeroed font-size marks a hidden reset element and must
                // never clobber a size resolved elsewhere in the subtree.
                "font-size" if value == "0" || value == "0px" => {}
                "font-size" => self.font_size = Some(value.to_string()),
                "color" => self.color = Some(value.to_string()),
                "font-family" => self.font_family = Some(value.to_string()),
                "font-weight" => self.font_weight = Some(value.to_string()),
                _ => {}
            }
        }
    }
}

/// Parses the leading signed, optionally-decimal numeric token of a CSS
/// value ("40px" -> 40.0, "-1.5em" -> -1.5). Returns `default` when the
/// value has no such token.
pub fn parse_number(value: &str, default: f32) -> f32 {
    let s = value.trim();
    let bytes = s.as_bytes();

    let mut i = 0;
    if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
        i += 1;
    }
    let start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let mut end = i;
    // A fractional part only counts when at least one digit follows the dot.
    if i < bytes.len() && bytes[i] == b'.' {
        let mut j = i + 1;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j > i + 1 {
            end = j;
        }
    }

    if end == start {
        return default;
    }
    s[..end].parse().unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::{parse_number, StyleMap};
    use proptest::prelude::*;

    #[test]
    fn parse_number_strips_units() {
        assert_eq!(parse_number("40px", 0.0), 40.0);
        assert_eq!(parse_number("12.5em", 0.0), 12.5);
        assert_eq!(parse_number("-3.5px", 0.0), -3.5);
        assert_eq!(parse_number("+.5", 0.0), 0.5);
        assert_eq!(parse_number("12.px", 0.0), 12.0);
    }

    #[test]
    fn parse_number_falls_back_to_default() {
        assert_eq!(parse_number("", 7.0), 7.0);
        assert_eq!(parse_number("auto", 7.0), 7.0);
        assert_eq!(parse_number("-px", 7.0), 7.0);
        assert_eq!(parse_number(".", 7.0), 7.0);
    }

    #[test]
    fn apply_extracts_and_trims_values() {
        let mut style = StyleMap::default();
        style.apply("margin-left: 40px ; width:20px;color: #FF0000");

        assert_eq!(style.margin_left.as_deref(), Some("40px"));
        assert_eq!(style.width.as_deref(), Some("20px"));
        assert_eq!(style.color.as_deref(), Some("#FF0000"));
        assert_eq!(style.padding_top, None);
    }

    #[test]
    fn apply_ignores_unknown_and_empty_declarations() {
        let mut style = StyleMap::default();
        style.apply("display:flex;width:;;font-weight:normal");

        assert_eq!(style.width, None);
        assert_eq!(style.font_weight.as_deref(), Some("normal"));
    }

    #[test]
    fn later_declarations_win_per_property() {
        let mut style = StyleMap::default();
        style.apply("margin-left:10px;font-family:serif");
        style.apply("margin-left:40px");

        assert_eq!(style.margin_left.as_deref(), Some("40px"));
        assert_eq!(style.font_family.as_deref(), Some("serif"));
    }

    #[test]
    fn zeroed_font_size_never_overrides() {
        let mut style = StyleMap::default();
        style.apply("font-size:16px");
        style.apply("font-size:0px");
        style.apply("font-size:0");
        assert_eq!(style.font_size.as_deref(), Some("16px"));

        let mut unset = StyleMap::default();
        unset.apply("font-size:0");
        assert_eq!(unset.font_size, None);
        unset.apply("font-size:12px");
        assert_eq!(unset.font_size.as_deref(), Some("12px"));
    }

    proptest! {
        #[test]
        fn parse_number_never_panics(value in ".*") {
            let _ = parse_number(&value, 0.0);
        }

        #[test]
        fn parse_number_round_trips_plain_floats(n in -1000.0f32..1000.0) {
            let value = format!("{}px", n);
            prop_assert_eq!(parse_number(&value, 0.0), n);
        }
    }
}
