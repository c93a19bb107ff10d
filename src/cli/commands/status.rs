//! Status command - reconciliation of workspace icons with the library.

use std::sync::Arc;

use super::open_index;
use crate::config::Settings;
use crate::types::BuildStatus;

pub async fn run(settings: Arc<Settings>) -> anyhow::Result<()> {
    let index = open_index(settings).await?;
    let reconciliation = index.reconcile().await?;

    if reconciliation.is_empty() {
        println!("No icons found");
        return Ok(());
    }

    for (name, status) in reconciliation.iter() {
        println!("{name:<32} {status}");
    }
    println!();
    println!(
        "{} draft, {} built, {} stale, {} orphaned",
        reconciliation.count(BuildStatus::Draft),
        reconciliation.count(BuildStatus::Built { stale: false }),
        reconciliation.count(BuildStatus::Built { stale: true }),
        reconciliation.count(BuildStatus::Orphaned)
    );
    Ok(())
}
