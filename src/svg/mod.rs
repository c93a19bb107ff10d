//! SVG content parsing: view box, body and color palette extraction.

mod color;
mod parser;

pub use color::normalize_color;
pub use parser::{
    ParsedSvg, extract_body, extract_colors, extract_view_box, open_tag, parse, replace_colors,
};

/// Collapse insignificant whitespace so formatting-only edits compare equal.
pub fn normalize_markup(markup: &str) -> String {
    let mut out = String::with_capacity(markup.len());
    let mut pending_space = false;
    for ch in markup.trim().chars() {
        if ch.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space {
            let last = out.chars().last();
            if ch != '<' && ch != '/' && ch != '>' && last != Some('>') {
                out.push(' ');
            }
            pending_space = false;
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_markup() {
        assert_eq!(
            normalize_markup("  <path d=\"M0 0\"  />\n   <g>\n</g> "),
            "<path d=\"M0 0\"/><g></g>"
        );
        assert_eq!(normalize_markup("<path\n  d=\"M1   2\"/>"), "<path d=\"M1 2\"/>");
    }
}
