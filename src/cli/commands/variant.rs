//! Variant command - named color palettes persisted in `variants.js`.

use std::sync::Arc;

use anyhow::{Context, bail};

use super::open_index;
use crate::cli::args::VariantAction;
use crate::config::Settings;
use crate::host::{EditorHost, FsHost};
use crate::indexing::IconIndex;
use crate::library::{LibrarySource, LibraryWriter};
use crate::types::{Icon, IconKey, IconKind, IconSource};
use crate::variants::VariantColorEngine;

pub async fn run(action: VariantAction, settings: Arc<Settings>) -> anyhow::Result<()> {
    let mut index = open_index(settings).await?;
    let mut engine = VariantColorEngine::from_table(index.library().load_variants().await?);

    match action {
        VariantAction::Save { icon, name, colors } => {
            let icon = draft_icon(&index, &icon)?;
            engine.save_variant(&icon, &name, colors)?;
            index.library().write_variants(engine.table()).await?;
            println!("Saved variant '{name}' for '{}'", icon.name);
        }
        VariantAction::Apply { icon, name } => {
            let icon = draft_icon(&index, &icon)?;
            let svg = engine.apply_variant(&icon, &name)?;
            write_back(&mut index, &icon, &svg).await?;
            println!("Applied variant '{name}' to '{}'", icon.name);
        }
        VariantAction::Reset { icon } => {
            let icon = draft_icon(&index, &icon)?;
            let svg = engine.reset(&icon)?;
            write_back(&mut index, &icon, &svg).await?;
            println!("Restored original colors of '{}'", icon.name);
        }
        VariantAction::Remove { icon, name } => {
            if !engine.remove_variant(&icon, &name)? {
                bail!("Icon '{icon}' has no variant '{name}'");
            }
            index.library().write_variants(engine.table()).await?;
            println!("Removed variant '{name}' from '{icon}'");
        }
        VariantAction::List { icon } => {
            let icon = draft_icon(&index, &icon)?;
            println!("{:<16} {}", "current", engine.extract_colors(&icon).join(" "));
            for variant in engine.variants(&icon.name) {
                println!("{:<16} {}", variant.name, variant.colors.join(" "));
            }
        }
    }
    Ok(())
}

/// The editable workspace icon named `name`; file icons win over inline.
fn draft_icon(index: &IconIndex, name: &str) -> anyhow::Result<Icon> {
    [IconKind::SvgFile, IconKind::InlineSvg]
        .into_iter()
        .find_map(|kind| index.get_icon(&IconKey::new(kind, name)))
        .cloned()
        .with_context(|| format!("No workspace icon named '{name}'"))
}

/// Replace the icon's markup where it lives, then re-index that file.
async fn write_back(index: &mut IconIndex, icon: &Icon, svg: &str) -> anyhow::Result<()> {
    let file = match &icon.source {
        IconSource::SvgFile { path } => {
            tokio::fs::write(path, svg)
                .await
                .with_context(|| format!("writing {}", path.display()))?;
            path.clone()
        }
        IconSource::InlineSvg { location, span } => {
            FsHost.apply_edit(&location.file, *span, svg).await?;
            location.file.clone()
        }
        IconSource::BuiltIcon { .. } => bail!("Built icons cannot be recolored in place"),
    };
    index.process_changes(&[file]).await;
    Ok(())
}
