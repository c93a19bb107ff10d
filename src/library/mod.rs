//! Built icon library: the generated artifacts and their build state.
//!
//! The library is an external collaborator. The reconciler only needs a
//! read-back of `name -> body` ([`LibrarySource`]); commands that emit icons or
//! persist variants go through [`LibraryWriter`]. [`FileLibrary`] implements
//! both over `icons.js`/`icons.ts`, `sprite.svg` and `variants.js`.

mod artifact;
mod reconcile;

pub use artifact::{FileLibrary, js_identifier};
pub use reconcile::{BuildStateReconciler, Reconciliation};

use async_trait::async_trait;
use indexmap::IndexMap;
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;

use crate::types::{Icon, ViewBox};

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed library artifact {path}: {reason}")]
    Malformed { path: PathBuf, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid icon name '{0}'")]
    InvalidName(String),
}

impl LibraryError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LibraryError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type LibraryResult<T> = Result<T, LibraryError>;

/// One entry read back from the library.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltEntry {
    pub name: String,
    /// Inner markup without the `<svg>` wrapper.
    pub body: String,
    pub view_box: ViewBox,
    /// Artifact the entry was read from.
    pub artifact: PathBuf,
}

impl BuiltEntry {
    /// Full markup with a standard wrapper.
    pub fn to_svg(&self) -> String {
        format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="{}">{}</svg>"#,
            self.view_box, self.body
        )
    }

    pub fn to_icon(&self) -> Icon {
        Icon::built(&self.name, &self.artifact, self.to_svg())
    }
}

/// Built icons by name.
pub type BuiltIcons = BTreeMap<String, BuiltEntry>;

/// `icon -> variant name -> colors`, with the reserved `_original` entry.
pub type VariantTable = IndexMap<String, IndexMap<String, Vec<String>>>;

/// Read-back side of the library.
#[async_trait]
pub trait LibrarySource: Send + Sync {
    /// Every built icon. A missing artifact is an empty mapping.
    async fn load_built_icons(&self) -> LibraryResult<BuiltIcons>;

    /// Persisted variants. A missing artifact is an empty table.
    async fn load_variants(&self) -> LibraryResult<VariantTable>;
}

/// Write side of the library.
#[async_trait]
pub trait LibraryWriter: Send + Sync {
    /// Append or replace an entry from full SVG markup.
    async fn write_icon(&self, name: &str, svg: &str) -> LibraryResult<()>;

    /// Remove an entry. Returns whether it existed.
    async fn remove_icon(&self, name: &str) -> LibraryResult<bool>;

    async fn write_variants(&self, variants: &VariantTable) -> LibraryResult<()>;
}
