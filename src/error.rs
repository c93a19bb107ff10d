//! Error types for indexing operations.
//!
//! Nothing here is fatal to a scan: per-file failures are logged and skipped,
//! malformed markup is surfaced as a non-editable icon, and collisions or
//! content drift are reported rather than raised.

use std::path::PathBuf;
use thiserror::Error;

use crate::types::IconKind;

#[derive(Error, Debug)]
pub enum IndexError {
    /// File unreadable or unwritable.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Markup that could not be parsed.
    #[error("Failed to parse {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    /// Duplicate icon name within one scan generation.
    #[error("Name collision for {kind} icon '{name}': {previous} replaced by {current}")]
    NameCollision {
        kind: IconKind,
        name: String,
        previous: PathBuf,
        current: PathBuf,
    },

    /// Built content drifted from its draft source.
    #[error("Built icon '{name}' differs from its source")]
    ReconcileMismatch { name: String },

    /// Invalid usage pattern built from configuration.
    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// The blocking directory walk did not finish.
    #[error("Directory walk failed: {0}")]
    Walk(String),

    #[error("Could not find icon {0}")]
    NotFound(String),

    #[error("Library error: {0}")]
    Library(#[from] crate::library::LibraryError),

    #[error("Editor host error: {0}")]
    Host(#[from] crate::host::HostError),
}

impl IndexError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        IndexError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type IndexResult<T> = Result<T, IndexError>;
