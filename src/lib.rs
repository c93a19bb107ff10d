pub mod logging;

pub mod cli;
pub mod config;
pub mod error;
pub mod host;
pub mod indexing;
pub mod library;
pub mod svg;
pub mod types;
pub mod variants;
pub mod watcher;

pub use types::*;
pub use config::Settings;
pub use error::{IndexError, IndexResult};
pub use host::{EditorHost, FsHost};
pub use indexing::{ChangeSummary, IconIndex, IconRegistry, ScanRequest, ScanStats};
pub use library::{BuildStateReconciler, FileLibrary, LibrarySource, LibraryWriter, Reconciliation};
pub use variants::{VariantColorEngine, VariantError};
pub use watcher::{IconEvent, IconWatcher, NotificationBroadcaster};
