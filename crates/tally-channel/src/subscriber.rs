//! A registered channel recipient.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc;

use tally_core::ids::ConnectionId;

use crate::message::Origin;

/// One subscribed connection: its origin identity and its outbound queue.
///
/// Sends never block: a full or closed queue counts as a dropped delivery
/// and the channel decides whether to evict the subscriber.
pub struct Subscriber {
    /// Connection this subscriber represents.
    pub id: ConnectionId,
    origin: Origin,
    tx: mpsc::Sender<Arc<String>>,
    dropped: AtomicU64,
}

impl Subscriber {
    /// Create a subscriber from a connection's outbound queue.
    #[must_use]
    pub fn new(id: ConnectionId, origin: Origin, tx: mpsc::Sender<Arc<String>>) -> Self {
        Self {
            id,
            origin,
            tx,
            dropped: AtomicU64::new(0),
        }
    }

    /// The origin identity used for echo suppression.
    #[must_use]
    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    /// Enqueue a wire frame.
    ///
    /// Returns `false` (and counts a drop) if the queue is full or the
    /// connection has gone away.
    pub fn send(&self, frame: Arc<String>) -> bool {
        if self.tx.try_send(frame).is_ok() {
            true
        } else {
            let _ = self.dropped.fetch_add(1, Ordering::Relaxed);
            false
        }
    }

    /// Whether the receiving side has been dropped.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Total deliveries dropped for this subscriber.
    #[must_use]
    pub fn drop_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}
