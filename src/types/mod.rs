//! Core data model shared by the scanner, registry, reconciler and variant engine.
//!
//! Icons are a tagged union over their origin ([`IconSource`]). Shared read-only
//! fields live on [`Icon`]; kind-specific data lives in the source variant, and
//! consumers match on it explicitly.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::svg;

/// Name of the reserved variant holding an icon's pristine color list.
pub const ORIGINAL_VARIANT: &str = "_original";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IconKind {
    SvgFile,
    InlineSvg,
    BuiltIcon,
}

impl IconKind {
    pub const ALL: [IconKind; 3] = [IconKind::SvgFile, IconKind::InlineSvg, IconKind::BuiltIcon];

    pub fn as_str(&self) -> &'static str {
        match self {
            IconKind::SvgFile => "svg-file",
            IconKind::InlineSvg => "inline",
            IconKind::BuiltIcon => "built",
        }
    }

    /// Draft icons are the ones found in source, not yet emitted into the library.
    pub fn is_draft(&self) -> bool {
        matches!(self, IconKind::SvgFile | IconKind::InlineSvg)
    }
}

impl fmt::Display for IconKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IconKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "svg-file" | "file" | "svg" => Ok(IconKind::SvgFile),
            "inline" | "inline-svg" => Ok(IconKind::InlineSvg),
            "built" | "built-icon" => Ok(IconKind::BuiltIcon),
            other => Err(format!("unknown icon kind '{other}'")),
        }
    }
}

/// Registry key: names are unique per kind, not globally.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IconKey {
    pub kind: IconKind,
    pub name: String,
}

impl IconKey {
    pub fn new(kind: IconKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }
}

impl fmt::Display for IconKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.name)
    }
}

/// A 1-based line position in a workspace file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub file: PathBuf,
    pub line: u32,
}

impl Location {
    pub fn new(file: impl Into<PathBuf>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file.display(), self.line)
    }
}

/// Numeric `viewBox`, defaulting to `0 0 24 24`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewBox {
    pub min_x: f64,
    pub min_y: f64,
    pub width: f64,
    pub height: f64,
}

impl Default for ViewBox {
    fn default() -> Self {
        Self {
            min_x: 0.0,
            min_y: 0.0,
            width: 24.0,
            height: 24.0,
        }
    }
}

impl FromStr for ViewBox {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<f64> = s
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|p| !p.is_empty())
            .map(|p| p.parse::<f64>().map_err(|e| format!("invalid viewBox '{s}': {e}")))
            .collect::<Result<_, _>>()?;

        match parts.as_slice() {
            [min_x, min_y, width, height] => Ok(Self {
                min_x: *min_x,
                min_y: *min_y,
                width: *width,
                height: *height,
            }),
            _ => Err(format!("viewBox '{s}' must have four numbers")),
        }
    }
}

impl fmt::Display for ViewBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.min_x, self.min_y, self.width, self.height)
    }
}

/// Hex-encoded SHA-256 of an icon's raw markup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(String);

impl ContentHash {
    pub fn of(content: &str) -> Self {
        Self(calculate_hash(content))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First eight hex digits, used for synthetic names.
    pub fn short(&self) -> &str {
        &self.0[..8.min(self.0.len())]
    }
}

/// Compute the SHA-256 hex digest of some content.
pub fn calculate_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Where an icon came from. Kind-specific data lives here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IconSource {
    /// A standalone `.svg` file.
    SvgFile { path: PathBuf },
    /// An `<svg>` block embedded in a source file.
    InlineSvg {
        location: Location,
        /// Byte range of the block within the source file.
        span: (usize, usize),
    },
    /// An entry in the generated icon library.
    BuiltIcon { library: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Icon {
    pub name: String,
    /// Raw markup including the `<svg>` wrapper.
    pub svg: String,
    pub view_box: ViewBox,
    /// Normalized colors in first-seen order. Positions are the variant join key.
    pub colors: Vec<String>,
    /// `false` when the markup could not be parsed (no closing tag).
    pub editable: bool,
    pub hash: ContentHash,
    pub source: IconSource,
}

impl Icon {
    fn build(name: String, svg: String, source: IconSource) -> Self {
        let parsed = svg::parse(&svg);
        let hash = ContentHash::of(&svg);
        Self {
            name,
            view_box: parsed.view_box,
            colors: parsed.colors,
            editable: parsed.well_formed,
            hash,
            svg,
            source,
        }
    }

    pub fn from_file(name: impl Into<String>, path: impl Into<PathBuf>, svg: impl Into<String>) -> Self {
        Self::build(
            name.into(),
            svg.into(),
            IconSource::SvgFile { path: path.into() },
        )
    }

    pub fn inline(
        name: impl Into<String>,
        location: Location,
        span: (usize, usize),
        svg: impl Into<String>,
    ) -> Self {
        Self::build(
            name.into(),
            svg.into(),
            IconSource::InlineSvg { location, span },
        )
    }

    pub fn built(name: impl Into<String>, library: impl Into<PathBuf>, svg: impl Into<String>) -> Self {
        Self::build(
            name.into(),
            svg.into(),
            IconSource::BuiltIcon {
                library: library.into(),
            },
        )
    }

    pub fn kind(&self) -> IconKind {
        match self.source {
            IconSource::SvgFile { .. } => IconKind::SvgFile,
            IconSource::InlineSvg { .. } => IconKind::InlineSvg,
            IconSource::BuiltIcon { .. } => IconKind::BuiltIcon,
        }
    }

    pub fn key(&self) -> IconKey {
        IconKey::new(self.kind(), self.name.clone())
    }

    /// Source location, absent for built icons.
    pub fn location(&self) -> Option<Location> {
        match &self.source {
            IconSource::SvgFile { path } => Some(Location::new(path.clone(), 1)),
            IconSource::InlineSvg { location, .. } => Some(location.clone()),
            IconSource::BuiltIcon { .. } => None,
        }
    }

    /// The workspace file backing this icon, if any.
    pub fn path(&self) -> Option<&Path> {
        match &self.source {
            IconSource::SvgFile { path } => Some(path),
            IconSource::InlineSvg { location, .. } => Some(&location.file),
            IconSource::BuiltIcon { .. } => None,
        }
    }

    /// Inner markup with the outer `<svg>` wrapper removed.
    pub fn body(&self) -> String {
        svg::parse(&self.svg).body
    }

    /// Replace the markup, re-deriving every cached field.
    pub fn with_svg(&self, svg: impl Into<String>) -> Self {
        Self::build(self.name.clone(), svg.into(), self.source.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageKind {
    /// `<Icon name="x" />`
    Component,
    /// `<svg-icon name="x">`
    CustomElement,
    /// `<img src="./x.svg">`
    Image,
    /// `<use href="#icon-x">`
    SpriteRef,
}

/// A location in source code where an icon is referenced by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UsageSite {
    pub file: PathBuf,
    pub line: u32,
    /// The matched line, trimmed.
    pub preview: String,
    pub referenced_name: String,
    pub kind: UsageKind,
    /// Byte range of the referenced token in the file (used for rename).
    pub span: (usize, usize),
}

/// Result of a usage search.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UsageSearch {
    pub usages: Vec<UsageSite>,
    pub total: usize,
}

/// A named alternate color list; `colors[i]` replaces the icon's `colors[i]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    pub name: String,
    pub colors: Vec<String>,
}

impl Variant {
    pub fn new(name: impl Into<String>, colors: Vec<String>) -> Self {
        Self {
            name: name.into(),
            colors,
        }
    }

    pub fn is_original(&self) -> bool {
        self.name == ORIGINAL_VARIANT
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BuildStatus {
    /// Found in source, not emitted into the library.
    Draft,
    /// Present in the library; `stale` when content drifted from the source.
    Built { stale: bool },
    /// In the library with no draft source.
    Orphaned,
}

impl fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildStatus::Draft => f.write_str("draft"),
            BuildStatus::Built { stale: false } => f.write_str("built"),
            BuildStatus::Built { stale: true } => f.write_str("built (stale)"),
            BuildStatus::Orphaned => f.write_str("orphaned"),
        }
    }
}

/// Lowercase, whitespace/underscore to `-`, everything else non-alphanumeric dropped.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut last_dash = true;
    for ch in input.trim().chars() {
        if ch.is_alphanumeric() {
            slug.extend(ch.to_lowercase());
            last_dash = false;
        } else if (ch.is_whitespace() || ch == '-' || ch == '_' || ch == '.') && !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Icon name for a standalone SVG file: the slugified file stem.
pub fn name_from_path(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;
    let name = slugify(stem);
    if name.is_empty() { None } else { Some(name) }
}
