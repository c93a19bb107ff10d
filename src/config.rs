//! Configuration for the icon workspace.
//!
//! Layered configuration:
//! - Default values
//! - TOML configuration file (`.iconscope/settings.toml`)
//! - Environment variable overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `ICONSCOPE_` and use double
//! underscores to separate nested levels:
//! - `ICONSCOPE_WATCHER__DEBOUNCE_MS=200` sets `watcher.debounce_ms`
//! - `ICONSCOPE_USAGES__COMPONENT_NAME=SvgIcon` sets `usages.component_name`
//! - `ICONSCOPE_LIBRARY__FORMAT=ts` sets `library.format`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Directory holding the settings file, relative to the workspace root.
pub const CONFIG_DIR: &str = ".iconscope";
const CONFIG_FILE: &str = "settings.toml";
const ENV_PREFIX: &str = "ICONSCOPE_";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Workspace root directory (where `.iconscope` is located)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_root: Option<PathBuf>,

    #[serde(default)]
    pub scan: ScanConfig,

    #[serde(default)]
    pub usages: UsageConfig,

    #[serde(default)]
    pub library: LibraryConfig,

    #[serde(default)]
    pub watcher: WatcherConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ScanConfig {
    /// Folders scanned for icons, relative to the workspace root
    #[serde(default = "default_roots")]
    pub roots: Vec<PathBuf>,

    /// Extensions treated as standalone SVG icons
    #[serde(default = "default_svg_extensions")]
    pub svg_extensions: Vec<String>,

    /// Extensions searched for inline SVG and icon usages
    #[serde(default = "default_source_extensions")]
    pub source_extensions: Vec<String>,

    /// Ignore file name (gitignore syntax), looked up in the workspace root
    #[serde(default = "default_ignore_file")]
    pub ignore_file: String,

    /// Extra ignore patterns applied on top of the ignore file
    #[serde(default = "default_ignore_patterns")]
    pub ignore_patterns: Vec<String>,

    /// Source files larger than this are skipped
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,

    /// Follow symlinks (loops are detected and skipped)
    #[serde(default = "default_true")]
    pub follow_links: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct UsageConfig {
    /// Component tag used to reference icons, e.g. `<Icon name="x" />`
    #[serde(default = "default_component_name")]
    pub component_name: String,

    /// Attribute carrying the icon name on components and custom elements
    #[serde(default = "default_name_attribute")]
    pub name_attribute: String,

    /// Custom element tag, e.g. `<svg-icon name="x">`
    #[serde(default = "default_custom_element")]
    pub custom_element: String,

    /// Sprite symbol id prefix, e.g. `<use href="#icon-x">`
    #[serde(default = "default_sprite_prefix")]
    pub sprite_prefix: String,

    /// Maximum preview length in characters
    #[serde(default = "default_preview_width")]
    pub preview_width: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LibraryFormat {
    #[default]
    Js,
    Ts,
}

impl LibraryFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            LibraryFormat::Js => "js",
            LibraryFormat::Ts => "ts",
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LibraryConfig {
    /// Where `icons.js`/`icons.ts`, `variants.js` and `sprite.svg` live
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    #[serde(default)]
    pub format: LibraryFormat,

    /// Also maintain `sprite.svg`
    #[serde(default = "default_true")]
    pub sprite: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WatcherConfig {
    /// Quiet period before a batch of changes is processed
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

/// Logging configuration, see [`crate::logging`].
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Default level: error, warn, info, debug, trace
    #[serde(default = "default_log_level")]
    pub default: String,

    /// Per-module overrides, e.g. `watcher = "debug"`
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

fn default_version() -> u32 {
    1
}
fn default_true() -> bool {
    true
}
fn default_roots() -> Vec<PathBuf> {
    vec![PathBuf::from(".")]
}
fn default_svg_extensions() -> Vec<String> {
    vec!["svg".to_string()]
}
fn default_source_extensions() -> Vec<String> {
    [
        "html", "htm", "js", "jsx", "ts", "tsx", "vue", "svelte", "astro", "php", "md", "mdx",
        "erb", "hbs",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
fn default_ignore_file() -> String {
    ".iconignore".to_string()
}
fn default_ignore_patterns() -> Vec<String> {
    vec![
        "node_modules/**".to_string(),
        ".git/**".to_string(),
        "dist/**".to_string(),
        "target/**".to_string(),
    ]
}
fn default_max_file_size() -> u64 {
    2 * 1024 * 1024
}
fn default_component_name() -> String {
    "Icon".to_string()
}
fn default_name_attribute() -> String {
    "name".to_string()
}
fn default_custom_element() -> String {
    "svg-icon".to_string()
}
fn default_sprite_prefix() -> String {
    "icon-".to_string()
}
fn default_preview_width() -> usize {
    120
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("icons")
}
fn default_debounce_ms() -> u64 {
    800
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            workspace_root: None,
            scan: ScanConfig::default(),
            usages: UsageConfig::default(),
            library: LibraryConfig::default(),
            watcher: WatcherConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            roots: default_roots(),
            svg_extensions: default_svg_extensions(),
            source_extensions: default_source_extensions(),
            ignore_file: default_ignore_file(),
            ignore_patterns: default_ignore_patterns(),
            max_file_size: default_max_file_size(),
            follow_links: true,
        }
    }
}

impl Default for UsageConfig {
    fn default() -> Self {
        Self {
            component_name: default_component_name(),
            name_attribute: default_name_attribute(),
            custom_element: default_custom_element(),
            sprite_prefix: default_sprite_prefix(),
            preview_width: default_preview_width(),
        }
    }
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            format: LibraryFormat::default(),
            sprite: true,
        }
    }
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: HashMap::new(),
        }
    }
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join(CONFIG_FILE));

        Self::load_from(config_path).map(|mut settings| {
            if settings.workspace_root.is_none() {
                settings.workspace_root = Self::workspace_root();
            }
            settings
        })
    }

    /// Load configuration from a specific file, with env overrides on top
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path.as_ref()))
            // Double underscore becomes a dot; single underscores stay within field names
            .merge(Env::prefixed(ENV_PREFIX).map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
            .extract()
            .map_err(Box::new)
    }

    /// Find the settings file by looking for `.iconscope` from cwd upwards
    pub fn find_workspace_config() -> Option<PathBuf> {
        Self::workspace_root().map(|root| root.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Get the workspace root directory (where `.iconscope` is located)
    pub fn workspace_root() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        for ancestor in current.ancestors() {
            let config_dir = ancestor.join(CONFIG_DIR);
            if config_dir.is_dir() {
                return Some(ancestor.to_path_buf());
            }
        }

        None
    }

    /// Workspace root, falling back to the current directory.
    pub fn root(&self) -> PathBuf {
        self.workspace_root
            .clone()
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Resolve a possibly relative path against the workspace root.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path == Path::new(".") {
            self.root()
        } else if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root().join(path)
        }
    }

    /// Absolute scan roots.
    pub fn scan_roots(&self) -> Vec<PathBuf> {
        self.scan.roots.iter().map(|r| self.resolve(r)).collect()
    }

    /// Absolute path of the ignore file.
    pub fn ignore_path(&self) -> PathBuf {
        self.root().join(&self.scan.ignore_file)
    }

    /// Absolute library output directory.
    pub fn library_dir(&self) -> PathBuf {
        self.resolve(&self.library.output_dir)
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.as_ref().parent().ok_or("Invalid path")?;
        std::fs::create_dir_all(parent)?;

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    /// Create a default settings file and ignore file under `root`
    pub fn init_config_file(root: &Path, force: bool) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_path = root.join(CONFIG_DIR).join(CONFIG_FILE);

        if !force && config_path.exists() {
            return Err("Configuration file already exists. Use --force to overwrite".into());
        }

        let settings = Settings::default();
        settings.save(&config_path)?;

        let ignore_path = root.join(&settings.scan.ignore_file);
        if force || !ignore_path.exists() {
            std::fs::write(&ignore_path, DEFAULT_IGNORE)?;
        }

        Ok(config_path)
    }
}

const DEFAULT_IGNORE: &str = r#"# Icon scan ignore patterns (gitignore syntax)
#
# Paths matching these patterns are never opened during scans.

# Dependencies and build output
node_modules/
dist/
build/
target/
coverage/

# Generated icon library
icons/

# Version control
.git/
"#;
