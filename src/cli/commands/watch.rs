//! Watch command - keep the index current until Ctrl+C.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::RwLock;
use tokio::sync::broadcast::error::RecvError;

use super::display_path;
use crate::config::Settings;
use crate::indexing::IconIndex;
use crate::watcher::{IconEvent, IconWatcher, NotificationBroadcaster};

pub async fn run(settings: Arc<Settings>) -> anyhow::Result<()> {
    let broadcaster = Arc::new(NotificationBroadcaster::default());
    let index = IconIndex::new(settings.clone())?.with_broadcaster(broadcaster.clone());
    let index = Arc::new(RwLock::new(index));

    let stats = index.write().await.refresh().await;
    println!(
        "Indexed {} icons and {} usages; watching for changes (Ctrl+C to stop)",
        stats.icons, stats.usages
    );

    let watcher = IconWatcher::builder()
        .index(index.clone())
        .broadcaster(broadcaster.clone())
        .roots(watch_roots(&settings))
        .debounce_ms(settings.watcher.debounce_ms)
        .build()?;

    let mut events = broadcaster.subscribe();
    let report = tokio::spawn({
        let settings = settings.clone();
        async move {
            loop {
                let event = match events.recv().await {
                    Ok(event) => event,
                    Err(RecvError::Lagged(_)) => continue,
                    Err(RecvError::Closed) => break,
                };
                match event {
                    IconEvent::FileReindexed { path } => {
                        println!("updated  {}", display_path(&settings, &path))
                    }
                    IconEvent::FileDeleted { path } => {
                        println!("removed  {}", display_path(&settings, &path))
                    }
                    IconEvent::LibraryChanged => println!("library reloaded"),
                    IconEvent::BatchProcessed { .. } | IconEvent::Refreshed => {}
                }
            }
        }
    });

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("[watcher] failed to listen for Ctrl+C: {e}");
        }
    };
    let result = watcher.run_until(shutdown).await;
    report.abort();
    result?;
    Ok(())
}

/// The workspace root plus any scan root outside it.
fn watch_roots(settings: &Settings) -> Vec<PathBuf> {
    let root = settings.root();
    let mut roots = vec![root.clone()];
    for scan_root in settings.scan_roots() {
        if !scan_root.starts_with(&root) && !roots.contains(&scan_root) {
            roots.push(scan_root);
        }
    }
    roots
}
