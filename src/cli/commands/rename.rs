//! Rename command - rename an icon, its variants and every reference to it.

use std::sync::Arc;

use anyhow::{Context, bail};

use super::{display_path, open_index};
use crate::config::Settings;
use crate::host::FsHost;
use crate::library::{LibrarySource, LibraryWriter};
use crate::types::{IconKey, IconKind, slugify};
use crate::variants::VariantColorEngine;

pub async fn run(old: &str, new: &str, settings: Arc<Settings>) -> anyhow::Result<()> {
    if new.is_empty() || slugify(new) != new {
        bail!("'{new}' is not a valid icon name (use lowercase letters, digits and '-')");
    }
    let mut index = open_index(settings.clone()).await?;
    if index.get_icon_by_name(new).is_some() {
        bail!("An icon named '{new}' already exists");
    }
    let file_icon = index
        .get_icon(&IconKey::new(IconKind::SvgFile, old))
        .and_then(|icon| icon.path().map(|p| p.to_path_buf()));
    if file_icon.is_none() && index.get_icon_by_name(old).is_none() && index.find_usages(old).total == 0 {
        bail!("No icon or reference named '{old}'");
    }

    let edits = index.rename_references(old, new, &FsHost).await?;

    if let Some(path) = file_icon {
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("svg");
        let target = path.with_file_name(format!("{new}.{extension}"));
        tokio::fs::rename(&path, &target)
            .await
            .with_context(|| format!("renaming {}", path.display()))?;
        index.process_changes(&[path, target.clone()]).await;
        println!("Renamed file to {}", display_path(&settings, &target));
    }

    let mut engine = VariantColorEngine::from_table(index.library().load_variants().await?);
    if engine.rename_icon(old, new) {
        index.library().write_variants(engine.table()).await?;
        println!("Moved variants of '{old}' to '{new}'");
    }

    println!("Rewrote {edits} references from '{old}' to '{new}'");
    if index.get_icon(&IconKey::new(IconKind::BuiltIcon, old)).is_some() {
        println!("Note: the library still holds '{old}'; run `iconscope build {new}` to rebuild it");
    }
    Ok(())
}
