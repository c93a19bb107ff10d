//! Debounce and coalescing state machine for change events.
//!
//! ```text
//! Idle --record--> Pending(deadline) --deadline passed--> Processing --finish--> Idle
//!                    ^   |  record re-arms                   |  record only queues
//!                    |   v                                   |
//!                    +-------------- finish with queued paths+
//! ```
//!
//! Time is passed in explicitly, so transitions are testable without sleeping.
//! Only one batch is processed at a time; paths recorded while processing
//! wait for the next batch.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tokio::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    Idle,
    /// Waiting for a quiet period that ends at `deadline`.
    Pending { deadline: Instant },
    /// A batch is being processed.
    Processing,
}

/// Collects changed paths into debounced batches.
#[derive(Debug)]
pub struct ChangeBatcher {
    state: WatchState,
    pending: BTreeSet<PathBuf>,
    delay: Duration,
    batches: u64,
}

impl ChangeBatcher {
    pub fn new(debounce_ms: u64) -> Self {
        Self {
            state: WatchState::Idle,
            pending: BTreeSet::new(),
            delay: Duration::from_millis(debounce_ms),
            batches: 0,
        }
    }

    pub fn state(&self) -> WatchState {
        self.state
    }

    /// Queue a changed path and re-arm the timer unless a batch is running.
    pub fn record(&mut self, path: PathBuf, now: Instant) {
        self.pending.insert(path);
        match self.state {
            WatchState::Idle | WatchState::Pending { .. } => {
                self.state = WatchState::Pending {
                    deadline: now + self.delay,
                };
            }
            WatchState::Processing => {}
        }
    }

    /// Drop a queued path (it was deleted and handled immediately).
    pub fn remove(&mut self, path: &Path) -> bool {
        let removed = self.pending.remove(path);
        if self.pending.is_empty() && matches!(self.state, WatchState::Pending { .. }) {
            self.state = WatchState::Idle;
        }
        removed
    }

    /// When the current quiet period ends, if one is running.
    pub fn deadline(&self) -> Option<Instant> {
        match self.state {
            WatchState::Pending { deadline } => Some(deadline),
            _ => None,
        }
    }

    /// Take the batch if its quiet period has passed, entering `Processing`.
    pub fn poll(&mut self, now: Instant) -> Option<Vec<PathBuf>> {
        match self.state {
            WatchState::Pending { deadline } if now >= deadline => {
                self.state = WatchState::Processing;
                self.batches += 1;
                Some(std::mem::take(&mut self.pending).into_iter().collect())
            }
            _ => None,
        }
    }

    /// Leave `Processing`; paths queued meanwhile start a new quiet period.
    pub fn finish(&mut self, now: Instant) {
        if self.state != WatchState::Processing {
            return;
        }
        self.state = if self.pending.is_empty() {
            WatchState::Idle
        } else {
            WatchState::Pending {
                deadline: now + self.delay,
            }
        };
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Batches taken so far.
    pub fn batches(&self) -> u64 {
        self.batches
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_rapid_events_coalesce_into_one_batch() {
        let mut batcher = ChangeBatcher::new(800);
        let t0 = Instant::now();

        batcher.record(PathBuf::from("/w/a.svg"), t0);
        batcher.record(PathBuf::from("/w/b.svg"), t0 + ms(100));
        batcher.record(PathBuf::from("/w/a.svg"), t0 + ms(300));
        batcher.record(PathBuf::from("/w/c.tsx"), t0 + ms(500));

        // each event re-armed the timer
        assert_eq!(batcher.deadline(), Some(t0 + ms(1300)));
        assert!(batcher.poll(t0 + ms(1000)).is_none());

        let batch = batcher.poll(t0 + ms(1300)).unwrap();
        assert_eq!(
            batch,
            vec![
                PathBuf::from("/w/a.svg"),
                PathBuf::from("/w/b.svg"),
                PathBuf::from("/w/c.tsx"),
            ]
        );
        assert_eq!(batcher.state(), WatchState::Processing);
        assert_eq!(batcher.batches(), 1);

        batcher.finish(t0 + ms(1400));
        assert_eq!(batcher.state(), WatchState::Idle);
        assert!(batcher.poll(t0 + ms(5000)).is_none());
        assert_eq!(batcher.batches(), 1);
    }

    #[test]
    fn test_events_during_processing_wait_for_next_batch() {
        let mut batcher = ChangeBatcher::new(50);
        let t0 = Instant::now();

        batcher.record(PathBuf::from("/w/a.svg"), t0);
        let first = batcher.poll(t0 + ms(50)).unwrap();
        assert_eq!(first.len(), 1);

        batcher.record(PathBuf::from("/w/b.svg"), t0 + ms(60));
        batcher.record(PathBuf::from("/w/c.svg"), t0 + ms(70));
        // no second batch while the first is still running
        assert_eq!(batcher.state(), WatchState::Processing);
        assert!(batcher.poll(t0 + ms(500)).is_none());

        batcher.finish(t0 + ms(100));
        assert_eq!(batcher.deadline(), Some(t0 + ms(150)));
        let second = batcher.poll(t0 + ms(150)).unwrap();
        assert_eq!(second, vec![PathBuf::from("/w/b.svg"), PathBuf::from("/w/c.svg")]);
        assert_eq!(batcher.batches(), 2);
    }

    #[test]
    fn test_remove_cancels_pending() {
        let mut batcher = ChangeBatcher::new(50);
        let t0 = Instant::now();
        let path = PathBuf::from("/w/a.svg");

        batcher.record(path.clone(), t0);
        assert!(batcher.has_pending());
        assert!(batcher.remove(&path));
        assert_eq!(batcher.state(), WatchState::Idle);
        assert!(batcher.deadline().is_none());
        assert!(!batcher.remove(&path));
    }

    #[test]
    fn test_finish_outside_processing_is_ignored() {
        let mut batcher = ChangeBatcher::new(50);
        let t0 = Instant::now();
        batcher.record(PathBuf::from("/w/a.svg"), t0);
        batcher.finish(t0 + ms(10));
        assert_eq!(batcher.deadline(), Some(t0 + ms(50)));
        assert_eq!(batcher.pending_count(), 1);
    }
}
