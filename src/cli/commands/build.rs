//! Build command - emit a draft icon into the library.

use std::sync::Arc;

use anyhow::bail;

use super::{display_path, open_index};
use crate::config::Settings;
use crate::library::LibraryWriter;
use crate::types::{IconKey, IconKind};

pub async fn run(name: &str, settings: Arc<Settings>) -> anyhow::Result<()> {
    let mut index = open_index(settings.clone()).await?;

    let Some(icon) = [IconKind::SvgFile, IconKind::InlineSvg]
        .into_iter()
        .find_map(|kind| index.get_icon(&IconKey::new(kind, name)))
        .cloned()
    else {
        bail!("No draft icon named '{name}' in the workspace");
    };
    if !icon.editable {
        bail!("Icon '{name}' has malformed markup and cannot be built");
    }

    index.library().write_icon(&icon.name, &icon.svg).await?;
    index.scan_library().await?;

    let status = index.reconcile().await?.get(name);
    println!(
        "Built '{name}' into {}{}",
        display_path(&settings, &index.library().icons_path()),
        status.map(|s| format!(" ({s})")).unwrap_or_default()
    );
    Ok(())
}
