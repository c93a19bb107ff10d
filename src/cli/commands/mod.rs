//! Command implementations for the CLI.
//!
//! Each command is implemented in its own module.

pub mod build;
pub mod init;
pub mod rename;
pub mod scan;
pub mod status;
pub mod usages;
pub mod variant;
pub mod watch;

use std::path::Path;
use std::sync::Arc;

use crate::config::Settings;
use crate::indexing::IconIndex;

/// Build an index over the workspace and run a full refresh.
pub(crate) async fn open_index(settings: Arc<Settings>) -> anyhow::Result<IconIndex> {
    let mut index = IconIndex::new(settings)?;
    let stats = index.refresh().await;
    if stats.failed > 0 {
        eprintln!("Warning: {} files could not be read", stats.failed);
    }
    Ok(index)
}

/// `path` relative to the workspace root when it lies inside it.
pub(crate) fn display_path(settings: &Settings, path: &Path) -> String {
    let root = settings.root();
    path.strip_prefix(&root)
        .unwrap_or(path)
        .display()
        .to_string()
}
