//! Icon usage detection in source files.
//!
//! Pattern-based, not a language parser: each source file is matched against
//! four syntactic shapes and every match becomes a [`UsageSite`]. There is no
//! cross-file index; callers filter the flat list by `referenced_name`.
//!
//! Recognized shapes (tag and attribute names come from [`UsageConfig`]):
//! - component tags: `<Icon name="arrow" />`, `<Icon name={"arrow"} />`
//! - custom elements: `<svg-icon name="arrow"></svg-icon>`
//! - images: `<img src="./icons/arrow.svg">`
//! - sprite references: `<use href="#icon-arrow" />`

use regex::Regex;
use std::path::Path;

use super::inline::find_inline_svgs;
use super::lines::LineIndex;
use crate::config::UsageConfig;
use crate::error::IndexResult;
use crate::types::{Icon, UsageKind, UsageSite, slugify};

/// Scans source text for inline SVG blocks and icon references.
#[derive(Debug, Clone)]
pub struct UsageIndexer {
    patterns: Vec<(UsageKind, Regex)>,
    preview_width: usize,
}

impl UsageIndexer {
    pub fn new(config: &UsageConfig) -> IndexResult<Self> {
        let attr = regex::escape(&config.name_attribute);
        // Tag, optional leading attributes, then the name attribute with an
        // optional JSX brace around a quoted literal.
        let tagged = |tag: &str| {
            format!(
                r#"<{tag}(?:\s[^>]*?)?\s{attr}\s*=\s*\{{?\s*["'`]([^"'`{{}}\s]+)["'`]"#,
                tag = regex::escape(tag),
            )
        };

        let mut patterns = Vec::new();
        if !config.component_name.is_empty() {
            patterns.push((UsageKind::Component, Regex::new(&tagged(&config.component_name))?));
        }
        if !config.custom_element.is_empty() {
            patterns.push((
                UsageKind::CustomElement,
                Regex::new(&tagged(&config.custom_element))?,
            ));
        }
        patterns.push((
            UsageKind::Image,
            Regex::new(r#"(?i)<img(?:\s[^>]*?)?\ssrc\s*=\s*["']([^"']*?\.svg)(?:[?#][^"']*)?["']"#)?,
        ));
        patterns.push((
            UsageKind::SpriteRef,
            Regex::new(&format!(
                r#"(?i)<use(?:\s[^>]*?)?\s(?:xlink:)?href\s*=\s*["'][^"'#]*#{}([^"'\s]+)["']"#,
                regex::escape(&config.sprite_prefix)
            ))?,
        ));

        Ok(Self {
            patterns,
            preview_width: config.preview_width,
        })
    }

    /// Inline-SVG pass.
    pub fn inline_svgs(&self, path: &Path, content: &str) -> Vec<Icon> {
        find_inline_svgs(path, content)
    }

    /// Usage-site pass. Results are in document order.
    pub fn find_usages(&self, path: &Path, content: &str) -> Vec<UsageSite> {
        let lines = LineIndex::new(content);
        let mut sites = Vec::new();

        for (kind, pattern) in &self.patterns {
            for caps in pattern.captures_iter(content) {
                let Some(m) = caps.get(1) else {
                    continue;
                };
                let Some((name, span)) = referenced_name(*kind, m.as_str(), m.start()) else {
                    continue;
                };
                let line = lines.line_of(m.start());
                sites.push(UsageSite {
                    file: path.to_path_buf(),
                    line,
                    preview: lines.preview(line, self.preview_width),
                    referenced_name: name,
                    kind: *kind,
                    span,
                });
            }
        }

        sites.sort_by_key(|s| s.span.0);
        sites
    }
}

/// Resolve the icon name a captured token refers to, with the byte span of
/// the part a rename would rewrite.
fn referenced_name(kind: UsageKind, token: &str, start: usize) -> Option<(String, (usize, usize))> {
    match kind {
        UsageKind::Image => {
            // `./icons/arrow.svg` -> `arrow`; the span covers the file stem.
            let file = token.rsplit('/').next().unwrap_or(token);
            let stem = &file[..file.len().checked_sub(".svg".len())?];
            let name = slugify(stem);
            if name.is_empty() {
                return None;
            }
            let stem_start = start + token.len() - file.len();
            Some((name, (stem_start, stem_start + stem.len())))
        }
        _ => Some((token.to_string(), (start, start + token.len()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn indexer() -> UsageIndexer {
        UsageIndexer::new(&UsageConfig::default()).unwrap()
    }

    #[test]
    fn test_img_usage() {
        let content = "<div>\n  <img src=\"./icons/arrow.svg\">\n</div>";
        let sites = indexer().find_usages(Path::new("index.html"), content);
        assert_eq!(sites.len(), 1);
        assert_eq!(sites[0].referenced_name, "arrow");
        assert_eq!(sites[0].kind, UsageKind::Image);
        assert_eq!(sites[0].line, 2);
        assert_eq!(sites[0].preview, "<img src=\"./icons/arrow.svg\">");
        assert_eq!(&content[sites[0].span.0..sites[0].span.1], "arrow");
    }

    #[test]
    fn test_component_usage_variants() {
        let content = r#"
export const A = () => <Icon name="home" />;
export const B = () => <Icon size={16} name={"user-circle"} />;
export const C = () => <IconButton name="not-an-icon" />;
export const D = () => <Icon
    name='multi-line'
/>;
"#;
        let sites = indexer().find_usages(Path::new("a.tsx"), content);
        let names: Vec<_> = sites.iter().map(|s| s.referenced_name.as_str()).collect();
        assert_eq!(names, vec!["home", "user-circle", "multi-line"]);
        assert!(sites.iter().all(|s| s.kind == UsageKind::Component));
        assert_eq!(sites[2].line, 6);
    }

    #[test]
    fn test_custom_element_and_sprite() {
        let content = r##"<svg-icon name="bell"></svg-icon>
<svg><use href="sprite.svg#icon-star"/></svg>
<svg><use xlink:href="#icon-moon"></use></svg>
<svg><use href="#other-sun"/></svg>"##;
        let sites = indexer().find_usages(Path::new("page.html"), content);
        let found: Vec<_> = sites
            .iter()
            .map(|s| (s.kind, s.referenced_name.as_str(), s.line))
            .collect();
        assert_eq!(
            found,
            vec![
                (UsageKind::CustomElement, "bell", 1),
                (UsageKind::SpriteRef, "star", 2),
                (UsageKind::SpriteRef, "moon", 3),
            ]
        );
    }

    #[test]
    fn test_custom_component_name() {
        let config = UsageConfig {
            component_name: "SvgIcon".to_string(),
            name_attribute: "icon".to_string(),
            ..UsageConfig::default()
        };
        let indexer = UsageIndexer::new(&config).unwrap();
        let sites = indexer.find_usages(
            Path::new("a.jsx"),
            "<SvgIcon icon=\"gear\" /><Icon name=\"ignored\" />",
        );
        assert_eq!(sites.len(), 1);
        assert_eq!(sites[0].referenced_name, "gear");
    }

    #[test]
    fn test_img_with_query_and_uppercase() {
        let content = "<IMG alt=\"x\" src=\"/static/Big Logo.svg?v=2\">";
        let sites = indexer().find_usages(Path::new("a.html"), content);
        assert_eq!(sites.len(), 1);
        assert_eq!(sites[0].referenced_name, "big-logo");
    }

    #[test]
    fn test_inline_pass_is_independent() {
        let content = "<svg id=\"x\"><use href=\"#icon-y\"/></svg>";
        let indexer = indexer();
        assert_eq!(indexer.inline_svgs(Path::new("a.html"), content).len(), 1);
        assert_eq!(indexer.find_usages(Path::new("a.html"), content).len(), 1);
    }
}
