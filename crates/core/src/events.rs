//! Local change notifications.
//!
//! Repositories publish a [`DataChange`] after every committed write; the sync
//! observer subscribes to coalesce them into cloud pushes. Publishing with no
//! subscriber is a no-op.

use log::trace;
use tokio::sync::broadcast;

/// Default buffer for the change channel. Slow subscribers see a lag signal
/// instead of blocking writers.
pub const CHANGE_FEED_CAPACITY: usize = 64;

/// Which local table changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataChange {
    Vehicles,
    Fuels,
}

#[derive(Debug, Clone)]
pub struct ChangeFeed {
    sender: broadcast::Sender<DataChange>,
}

impl ChangeFeed {
    pub fn new() -> Self {
        Self::with_capacity(CHANGE_FEED_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn notify(&self, change: DataChange) {
        if self.sender.send(change).is_err() {
            trace!("[ChangeFeed] No subscribers for {:?}", change);
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DataChange> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}
