//! Usages and Reveal commands.

use std::sync::Arc;

use super::{display_path, open_index};
use crate::config::Settings;
use crate::host::FsHost;

/// Run the usages command. Exits non-zero when nothing references `name`.
pub async fn run(name: &str, json: bool, settings: Arc<Settings>) -> anyhow::Result<bool> {
    let index = open_index(settings.clone()).await?;
    let search = index.find_usages(name);

    if json {
        println!("{}", serde_json::to_string_pretty(&search)?);
        return Ok(search.total > 0);
    }

    if search.total == 0 {
        println!("No usages of '{name}'");
        return Ok(false);
    }
    for site in &search.usages {
        println!(
            "{}:{}  {}",
            display_path(&settings, &site.file),
            site.line,
            site.preview
        );
    }
    println!();
    println!("{} usages of '{name}'", search.total);
    Ok(true)
}

/// Run the reveal command.
pub async fn run_reveal(name: &str, settings: Arc<Settings>) -> anyhow::Result<()> {
    let index = open_index(settings).await?;
    index.reveal_icon(name, &FsHost).await?;
    Ok(())
}
