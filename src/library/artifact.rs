//! File-backed library artifacts.
//!
//! - `icons.js` / `icons.ts`: one `export const` line per icon
//! - `sprite.svg`: one `<symbol>` per icon, ids carry the sprite prefix
//! - `variants.js`: `export const Variants = {…};` with a JSON object literal

use async_trait::async_trait;
use regex::Regex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use super::{
    BuiltEntry, BuiltIcons, LibraryError, LibraryResult, LibrarySource, LibraryWriter,
    VariantTable,
};
use crate::config::{LibraryConfig, LibraryFormat};
use crate::svg;
use crate::types::ViewBox;

const HEADER: &str = "// Generated by iconscope. Do not edit by hand.\n";

const TS_INTERFACE: &str = "export interface IconDefinition {
  name: string;
  body: string;
  viewBox: string;
}
";

const VARIANTS_PREFIX: &str = "export const Variants = ";

/// Words that cannot name a `const` binding in a module.
const RESERVED_WORDS: &[&str] = &[
    "await", "break", "case", "catch", "class", "const", "continue", "debugger", "default",
    "delete", "do", "else", "enum", "export", "extends", "false", "finally", "for", "function",
    "if", "implements", "import", "in", "instanceof", "interface", "let", "new", "null",
    "package", "private", "protected", "public", "return", "static", "super", "switch", "this",
    "throw", "true", "try", "typeof", "var", "void", "while", "with", "yield", "arguments",
    "eval",
];

static ICON_ENTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?s)export\s+const\s+[A-Za-z_$][\w$]*\s*(?::\s*\w+\s*)?=\s*\{\s*name:\s*'([^']+)',\s*body:\s*`((?:[^`\\]|\\.)*)`,\s*viewBox:\s*'([^']*)'\s*\}\s*;",
    )
    .expect("valid icon entry regex")
});

static SYMBOL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<symbol\b([^>]*)>(.*?)</symbol\s*>").expect("valid symbol regex")
});

static ID_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\bid\s*=\s*["']([^"']+)["']"#).expect("valid id regex"));

/// Library artifacts in one output directory.
#[derive(Debug, Clone)]
pub struct FileLibrary {
    dir: PathBuf,
    format: LibraryFormat,
    sprite: bool,
    sprite_prefix: String,
}

impl FileLibrary {
    pub fn new(dir: impl Into<PathBuf>, config: &LibraryConfig, sprite_prefix: &str) -> Self {
        Self {
            dir: dir.into(),
            format: config.format,
            sprite: config.sprite,
            sprite_prefix: sprite_prefix.to_string(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn icons_path(&self) -> PathBuf {
        self.dir.join(format!("icons.{}", self.format.extension()))
    }

    pub fn sprite_path(&self) -> PathBuf {
        self.dir.join("sprite.svg")
    }

    pub fn variants_path(&self) -> PathBuf {
        self.dir.join("variants.js")
    }

    /// Whether `path` is one of this library's artifacts.
    pub fn is_artifact(&self, path: &Path) -> bool {
        path == self.icons_path() || path == self.sprite_path() || path == self.variants_path()
    }

    async fn read_optional(path: &Path) -> LibraryResult<Option<String>> {
        match tokio::fs::read_to_string(path).await {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(LibraryError::io(path, e)),
        }
    }

    async fn write_file(&self, path: &Path, content: String) -> LibraryResult<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| LibraryError::io(&self.dir, e))?;
        tokio::fs::write(path, content)
            .await
            .map_err(|e| LibraryError::io(path, e))
    }

    async fn load_module(&self) -> LibraryResult<BuiltIcons> {
        let path = self.icons_path();
        Ok(Self::read_optional(&path)
            .await?
            .map(|text| parse_icons_module(&text, &path))
            .unwrap_or_default())
    }

    async fn load_sprite(&self) -> LibraryResult<BuiltIcons> {
        let path = self.sprite_path();
        Ok(Self::read_optional(&path)
            .await?
            .map(|text| parse_sprite(&text, &self.sprite_prefix, &path))
            .unwrap_or_default())
    }

    async fn store(&self, icons: &BuiltIcons) -> LibraryResult<()> {
        self.write_file(&self.icons_path(), render_icons_module(icons, self.format))
            .await?;
        if self.sprite {
            self.write_file(&self.sprite_path(), render_sprite(icons, &self.sprite_prefix))
                .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl LibrarySource for FileLibrary {
    async fn load_built_icons(&self) -> LibraryResult<BuiltIcons> {
        let mut icons = if self.sprite {
            self.load_sprite().await?
        } else {
            BuiltIcons::new()
        };
        // The module is authoritative where both define a name.
        icons.extend(self.load_module().await?);
        crate::debug_event!(
            "library",
            "loaded",
            "{} built icons from {}",
            icons.len(),
            self.dir.display()
        );
        Ok(icons)
    }

    async fn load_variants(&self) -> LibraryResult<VariantTable> {
        let path = self.variants_path();
        match Self::read_optional(&path).await? {
            Some(text) => parse_variants(&text, &path),
            None => Ok(VariantTable::new()),
        }
    }
}

#[async_trait]
impl LibraryWriter for FileLibrary {
    async fn write_icon(&self, name: &str, svg_text: &str) -> LibraryResult<()> {
        if !is_valid_name(name) {
            return Err(LibraryError::InvalidName(name.to_string()));
        }
        let parsed = svg::parse(svg_text);
        if !parsed.well_formed {
            return Err(LibraryError::Malformed {
                path: PathBuf::from(name),
                reason: "icon markup has no closing </svg>".to_string(),
            });
        }

        let mut icons = self.load_built_icons().await?;
        icons.insert(
            name.to_string(),
            BuiltEntry {
                name: name.to_string(),
                body: parsed.body,
                view_box: parsed.view_box,
                artifact: self.icons_path(),
            },
        );
        self.store(&icons).await?;
        crate::log_event!("library", "wrote", "{name} to {}", self.icons_path().display());
        Ok(())
    }

    async fn remove_icon(&self, name: &str) -> LibraryResult<bool> {
        let mut icons = self.load_built_icons().await?;
        if icons.remove(name).is_none() {
            return Ok(false);
        }
        self.store(&icons).await?;
        crate::log_event!("library", "removed", "{name}");
        Ok(true)
    }

    async fn write_variants(&self, variants: &VariantTable) -> LibraryResult<()> {
        let json = serde_json::to_string_pretty(variants)?;
        self.write_file(
            &self.variants_path(),
            format!("{HEADER}\n{VARIANTS_PREFIX}{json};\n"),
        )
        .await
    }
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// `arrow-right` -> `arrowRight`; a leading digit gets an `icon` prefix and a
/// reserved word an `Icon` suffix.
pub fn js_identifier(name: &str) -> String {
    let mut ident = String::with_capacity(name.len());
    let mut upper = false;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            if upper && !ident.is_empty() {
                ident.push(ch.to_ascii_uppercase());
            } else {
                ident.push(ch);
            }
            upper = false;
        } else {
            upper = true;
        }
    }
    if ident.is_empty() || ident.starts_with(|c: char| c.is_ascii_digit()) {
        let mut chars = ident.chars();
        let rest = match chars.next() {
            Some(first) => format!("{}{}", first.to_ascii_uppercase(), chars.as_str()),
            None => String::new(),
        };
        ident = format!("icon{rest}");
    }
    if RESERVED_WORDS.contains(&ident.as_str()) {
        ident.push_str("Icon");
    }
    ident
}

/// Hands out identifiers that are unique within one module.
#[derive(Default)]
struct IdentifierPool {
    taken: HashSet<String>,
}

impl IdentifierPool {
    fn claim(&mut self, name: &str) -> String {
        let base = js_identifier(name);
        let mut ident = base.clone();
        let mut suffix = 2;
        while !self.taken.insert(ident.clone()) {
            ident = format!("{base}{suffix}");
            suffix += 1;
        }
        ident
    }
}

fn escape_template(body: &str) -> String {
    body.replace('\\', "\\\\")
        .replace('`', "\\`")
        .replace("${", "\\${")
}

fn unescape_template(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(ch);
        }
    }
    out
}

fn parse_icons_module(text: &str, path: &Path) -> BuiltIcons {
    let mut icons = BuiltIcons::new();
    for caps in ICON_ENTRY.captures_iter(text) {
        let name = caps[1].to_string();
        let view_box = caps[3].parse::<ViewBox>().unwrap_or_else(|e| {
            crate::warn_event!("library", "{name} in {}: {e}", path.display());
            ViewBox::default()
        });
        icons.insert(
            name.clone(),
            BuiltEntry {
                name,
                body: unescape_template(&caps[2]),
                view_box,
                artifact: path.to_path_buf(),
            },
        );
    }
    icons
}

fn render_icons_module(icons: &BuiltIcons, format: LibraryFormat) -> String {
    let mut out = String::from(HEADER);
    out.push('\n');
    let annotation = match format {
        LibraryFormat::Ts => {
            out.push_str(TS_INTERFACE);
            out.push('\n');
            ": IconDefinition"
        }
        LibraryFormat::Js => "",
    };
    let mut identifiers = IdentifierPool::default();
    for entry in icons.values() {
        out.push_str(&format!(
            "export const {}{annotation} = {{ name: '{}', body: `{}`, viewBox: '{}' }};\n",
            identifiers.claim(&entry.name),
            entry.name,
            escape_template(&entry.body),
            entry.view_box
        ));
    }
    out
}

fn parse_sprite(text: &str, prefix: &str, path: &Path) -> BuiltIcons {
    let mut icons = BuiltIcons::new();
    for caps in SYMBOL.captures_iter(text) {
        let attrs = &caps[1];
        let Some(id) = ID_ATTR.captures(attrs).map(|c| c[1].to_string()) else {
            continue;
        };
        let Some(name) = id.strip_prefix(prefix).filter(|n| !n.is_empty()) else {
            crate::debug_event!("library", "foreign symbol", "{id}");
            continue;
        };
        icons.insert(
            name.to_string(),
            BuiltEntry {
                name: name.to_string(),
                body: caps[2].trim().to_string(),
                view_box: svg::extract_view_box(attrs),
                artifact: path.to_path_buf(),
            },
        );
    }
    icons
}

fn render_sprite(icons: &BuiltIcons, prefix: &str) -> String {
    let mut out =
        String::from("<svg xmlns=\"http://www.w3.org/2000/svg\" style=\"display: none;\">\n");
    for entry in icons.values() {
        out.push_str(&format!(
            "  <symbol id=\"{prefix}{}\" viewBox=\"{}\">{}</symbol>\n",
            entry.name, entry.view_box, entry.body
        ));
    }
    out.push_str("</svg>\n");
    out
}

fn parse_variants(text: &str, path: &Path) -> LibraryResult<VariantTable> {
    let Some(start) = text.find(VARIANTS_PREFIX) else {
        if text.trim().is_empty() || text.lines().all(|l| l.trim_start().starts_with("//")) {
            return Ok(VariantTable::new());
        }
        return Err(LibraryError::Malformed {
            path: path.to_path_buf(),
            reason: "missing `export const Variants`".to_string(),
        });
    };
    let json = text[start + VARIANTS_PREFIX.len()..]
        .trim()
        .trim_end_matches(';')
        .trim_end();
    serde_json::from_str(json).map_err(|e| LibraryError::Malformed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}
