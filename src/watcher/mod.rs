//! Change watcher for incremental re-indexing.
//!
//! # Architecture
//!
//! ```text
//! IconWatcher
//!   - notify::RecommendedWatcher (recursive, per root)
//!   - ChangeBatcher: Idle -> Pending(deadline) -> Processing -> Idle
//!   - Arc<RwLock<IconIndex>>: process_changes(batch)
//!   - NotificationBroadcaster: IconEvent to consumers
//! ```
//!
//! Deletions skip the debounce and are applied as they arrive.

mod debouncer;
mod error;
mod notifications;
mod unified;

pub use debouncer::{ChangeBatcher, WatchState};
pub use error::WatchError;
pub use notifications::{IconEvent, NotificationBroadcaster};
pub use unified::{IconWatcher, IconWatcherBuilder};
