//! Regex-based SVG content extraction.
//!
//! Pulls `viewBox`, inner body and the ordered color palette out of raw SVG
//! text. This is deliberately not an XML parser: markup only has to be
//! good enough to find the outer wrapper and color-bearing attributes.

use regex::Regex;
use std::collections::HashMap;
use std::ops::Range;
use std::sync::LazyLock;

use super::color::normalize_color;
use crate::types::ViewBox;

static OPEN_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<svg(?:\s[^>]*)?>").expect("valid svg open-tag regex"));

static CLOSE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</svg\s*>").expect("valid svg close-tag regex"));

static VIEW_BOX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\bviewBox\s*=\s*["']([^"']*)["']"#).expect("valid viewBox regex")
});

/// `fill="…"` / `stroke="…"` attributes.
static PAINT_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:^|\s)(?:fill|stroke)\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
        .expect("valid paint attribute regex")
});

/// `stop-color` as an attribute or a CSS property.
static STOP_COLOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:^|[\s;{"'])stop-color\s*(?:=\s*(?:"([^"]*)"|'([^']*)')|:\s*([^;"'}<>]+))"#)
        .expect("valid stop-color regex")
});

/// `fill:` / `stroke:` declarations in `style="…"` attributes or `<style>` blocks.
static PAINT_DECL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:^|[;{\s"'])(?:fill|stroke)\s*:\s*([^;}"'<>]+)"#)
        .expect("valid paint declaration regex")
});

/// Result of parsing one SVG document.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedSvg {
    pub view_box: ViewBox,
    /// Inner markup, wrapper tags stripped. Empty for malformed input.
    pub body: String,
    pub colors: Vec<String>,
    /// `false` when there is no closing `</svg>`; such icons are shown but not editable.
    pub well_formed: bool,
}

/// Parse SVG text into view box, body and colors.
///
/// Malformed markup yields an empty body and no colors rather than an error.
pub fn parse(svg_text: &str) -> ParsedSvg {
    let view_box = extract_view_box(svg_text);
    match wrapper_bounds(svg_text) {
        Some((_, inner)) => ParsedSvg {
            view_box,
            body: svg_text[inner].trim().to_string(),
            colors: extract_colors(svg_text),
            well_formed: true,
        },
        None => ParsedSvg {
            view_box,
            body: String::new(),
            colors: Vec::new(),
            well_formed: false,
        },
    }
}

/// Extract the `viewBox`, falling back to `0 0 24 24`.
pub fn extract_view_box(svg_text: &str) -> ViewBox {
    VIEW_BOX
        .captures(svg_text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or_default()
}

/// Extract the inner markup between the outer `<svg …>` and the last `</svg>`.
pub fn extract_body(svg_text: &str) -> Option<String> {
    wrapper_bounds(svg_text).map(|(_, inner)| svg_text[inner].trim().to_string())
}

/// The opening `<svg …>` tag, verbatim.
pub fn open_tag(svg_text: &str) -> Option<&str> {
    wrapper_bounds(svg_text).map(|(open, _)| &svg_text[open])
}

/// Returns (open-tag range, inner range) when both wrapper tags are present.
fn wrapper_bounds(svg_text: &str) -> Option<(Range<usize>, Range<usize>)> {
    let open = OPEN_TAG.find(svg_text)?;
    let close = CLOSE_TAG.find_iter(svg_text).last()?;
    if close.start() < open.end() {
        return None;
    }
    Some((open.range(), open.end()..close.start()))
}

/// A color-bearing value located in markup.
#[derive(Debug, Clone)]
struct ColorToken {
    range: Range<usize>,
    normalized: String,
}

/// Find every recolorable value, grouped by pattern priority.
fn color_tokens(svg_text: &str) -> Vec<ColorToken> {
    let mut tokens = Vec::new();
    for pattern in [&*PAINT_ATTR, &*STOP_COLOR, &*PAINT_DECL] {
        for caps in pattern.captures_iter(svg_text) {
            let Some(m) = caps.iter().skip(1).flatten().next() else {
                continue;
            };
            let raw = m.as_str();
            let Some(normalized) = normalize_color(raw) else {
                continue;
            };
            // Replacements keep surrounding whitespace and any `!important`.
            let lead = raw.len() - raw.trim_start().len();
            let value = raw.trim();
            let value = value
                .strip_suffix("!important")
                .map(str::trim_end)
                .unwrap_or(value);
            let start = m.start() + lead;
            tokens.push(ColorToken {
                range: start..start + value.len(),
                normalized,
            });
        }
    }
    tokens
}

/// Extract distinct normalized colors.
///
/// Ordering contract: fill/stroke attributes first, then `stop-color`, then
/// CSS declarations; within a pattern, document order. Duplicates keep their
/// first position.
pub fn extract_colors(svg_text: &str) -> Vec<String> {
    let mut colors: Vec<String> = Vec::new();
    for token in color_tokens(svg_text) {
        if !colors.contains(&token.normalized) {
            colors.push(token.normalized);
        }
    }
    colors
}

/// Replace colors in one pass.
///
/// `mapping` is keyed by normalized color. All replacements are computed
/// against the input, so `a -> b, b -> a` swaps rather than chaining.
pub fn replace_colors(svg_text: &str, mapping: &HashMap<String, String>) -> String {
    let mut tokens: Vec<ColorToken> = color_tokens(svg_text)
        .into_iter()
        .filter(|t| mapping.contains_key(&t.normalized))
        .collect();
    tokens.sort_by_key(|t| t.range.start);

    let mut out = String::with_capacity(svg_text.len());
    let mut cursor = 0;
    for token in tokens {
        if token.range.start < cursor {
            continue;
        }
        out.push_str(&svg_text[cursor..token.range.start]);
        if let Some(replacement) = mapping.get(&token.normalized) {
            out.push_str(replacement);
        }
        cursor = token.range.end;
    }
    out.push_str(&svg_text[cursor..]);
    out
}
