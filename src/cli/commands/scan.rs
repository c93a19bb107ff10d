//! Scan command - index the workspace and list what was found.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;

use super::display_path;
use crate::config::Settings;
use crate::indexing::{IconIndex, ScanStats};
use crate::types::Icon;

#[derive(Serialize)]
struct ScanReport<'a> {
    stats: &'a ScanStats,
    icons: Vec<&'a Icon>,
}

/// Run the scan command.
///
/// With a folder only standalone SVG files under it are scanned; otherwise
/// every pass runs and the library is loaded.
pub async fn run(folder: Option<PathBuf>, json: bool, settings: Arc<Settings>) -> anyhow::Result<()> {
    let mut index = IconIndex::new(settings.clone())?;
    let stats = match &folder {
        Some(folder) => index.scan_folder(folder).await,
        None => index.refresh().await,
    };
    let icons = index.get_all_icons(None);

    if json {
        let report = ScanReport {
            stats: &stats,
            icons,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    for icon in &icons {
        let location = icon
            .location()
            .map(|loc| format!("{}:{}", display_path(&settings, &loc.file), loc.line))
            .unwrap_or_else(|| "library".to_string());
        let flag = if icon.editable { "" } else { "  (malformed)" };
        println!(
            "{:<10} {:<28} {:<3} colors  {location}{flag}",
            icon.kind(),
            icon.name,
            icon.colors.len()
        );
    }
    println!();
    println!(
        "{} icons in {} files ({} unchanged, {} pruned, {} collisions, {} usages) in {:.2?}",
        stats.icons,
        stats.files,
        stats.unchanged,
        stats.pruned,
        stats.collisions,
        stats.usages,
        stats.elapsed
    );
    if stats.failed > 0 {
        println!("{} files could not be read", stats.failed);
    }
    Ok(())
}
