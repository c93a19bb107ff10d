//! Inline `<svg>…</svg>` detection in source files.
//!
//! Regex-driven: blocks are matched non-greedily from an opening `<svg>` tag
//! to the next `</svg>`. Nested or dynamically assembled markup (template
//! expressions building the SVG at runtime) is not recovered.

use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

use super::lines::LineIndex;
use crate::types::{ContentHash, Icon, Location, slugify};

static OPEN_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<svg(?:\s[^>]*)?/?>").expect("valid svg open-tag regex"));

static CLOSE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</svg\s*>").expect("valid svg close-tag regex"));

static ID_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\sid\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("valid id regex")
});

static ARIA_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\saria-label\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("valid aria-label regex")
});

/// Find every complete inline SVG block in `content`.
///
/// An opening tag with no closing tag after it is not a match.
pub fn find_inline_svgs(path: &Path, content: &str) -> Vec<Icon> {
    let lines = LineIndex::new(content);
    let mut icons = Vec::new();
    let mut cursor = 0;

    while let Some(open) = OPEN_TAG.find_at(content, cursor) {
        if open.as_str().ends_with("/>") {
            cursor = open.end();
            continue;
        }
        let Some(close) = CLOSE_TAG.find_at(content, open.end()) else {
            // Nothing after this point can close either.
            break;
        };

        let markup = &content[open.start()..close.end()];
        let name = inline_name(path, open.as_str(), markup);
        let location = Location::new(path, lines.line_of(open.start()));
        icons.push(Icon::inline(
            name,
            location,
            (open.start(), close.end()),
            markup,
        ));

        cursor = close.end();
    }

    icons
}

/// `id`, then slugified `aria-label`, then `{file-stem}-{hash}`.
fn inline_name(path: &Path, open_tag: &str, markup: &str) -> String {
    for pattern in [&*ID_ATTR, &*ARIA_LABEL] {
        let value = pattern
            .captures(open_tag)
            .and_then(|caps| caps.iter().skip(1).flatten().next())
            .map(|m| slugify(m.as_str()));
        if let Some(name) = value.filter(|n| !n.is_empty()) {
            return name;
        }
    }

    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .map(slugify)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "inline".to_string());
    format!("{stem}-{}", ContentHash::of(markup).short())
}
