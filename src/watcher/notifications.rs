//! Change notifications for index consumers.
//!
//! The watcher and the index publish on a broadcast channel; tree views,
//! previews and tests subscribe and re-read through the query API.

use std::path::PathBuf;
use tokio::sync::broadcast;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IconEvent {
    /// Icons or usages backed by this file changed.
    FileReindexed { path: PathBuf },
    /// Entries backed by this path were dropped.
    FileDeleted { path: PathBuf },
    /// One debounced batch finished.
    BatchProcessed { paths: Vec<PathBuf> },
    /// Built artifacts were re-read.
    LibraryChanged,
    /// A full rescan completed.
    Refreshed,
}

/// Fan-out of [`IconEvent`]s to any number of subscribers.
#[derive(Clone)]
pub struct NotificationBroadcaster {
    sender: broadcast::Sender<IconEvent>,
}

impl NotificationBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn send(&self, event: IconEvent) {
        match self.sender.send(event.clone()) {
            Ok(count) => {
                crate::debug_event!("broadcast", "sent", "{event:?} to {count} subscribers");
            }
            Err(_) => {
                crate::debug_event!("broadcast", "dropped", "no subscribers for {event:?}");
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<IconEvent> {
        self.sender.subscribe()
    }
}

impl Default for NotificationBroadcaster {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_without_subscribers_is_fine() {
        let broadcaster = NotificationBroadcaster::new(4);
        broadcaster.send(IconEvent::Refreshed);

        let mut rx = broadcaster.subscribe();
        broadcaster.send(IconEvent::FileDeleted {
            path: PathBuf::from("a.svg"),
        });
        assert_eq!(
            rx.recv().await.unwrap(),
            IconEvent::FileDeleted {
                path: PathBuf::from("a.svg")
            }
        );
    }
}
