//! A single session's broadcast channel.

use std::collections::HashMap;
use std::sync::Arc;

use metrics::counter;
use parking_lot::Mutex;
use tracing::{debug, warn};

use tally_core::errors::TransportError;
use tally_core::ids::ConnectionId;

use crate::message::Message;
use crate::subscriber::Subscriber;

/// Maximum lifetime delivery drops before a slow subscriber is evicted.
const MAX_TOTAL_DROPS: u64 = 100;

/// The in-memory fan-out unit bound 1:1 to a session code.
///
/// The subscriber set is guarded by one mutex held for the whole fan-out,
/// which is what gives each subscriber publish-order (FIFO) delivery.
/// Individual sends are non-blocking `try_send`s, so the critical section
/// stays short and a publish can never stall on a slow client.
pub struct Channel {
    code: String,
    subscribers: Mutex<HashMap<ConnectionId, Arc<Subscriber>>>,
}

impl Channel {
    /// Create an empty channel for a session code.
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            subscribers: Mutex::new(HashMap::new()),
        }
    }

    /// The session code this channel serves.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Register a subscriber. Re-subscribing the same connection is a
    /// no-op (the original registration stays).
    pub fn subscribe(&self, subscriber: Arc<Subscriber>) {
        let mut subs = self.subscribers.lock();
        let _ = subs.entry(subscriber.id.clone()).or_insert(subscriber);
    }

    /// Remove a subscriber. Returns `true` if it was present.
    pub fn unsubscribe(&self, connection: &ConnectionId) -> bool {
        self.subscribers.lock().remove(connection).is_some()
    }

    /// Whether any subscribers remain.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscribers.lock().is_empty()
    }

    /// Current subscriber count.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }

    /// Serialize once and fan out to every subscriber the origin filter
    /// admits. Returns the number of successful deliveries.
    ///
    /// Subscribers whose connection is gone, or whose lifetime drop count
    /// passes [`MAX_TOTAL_DROPS`], are removed; nobody else is affected.
    pub fn publish(&self, message: &Message) -> usize {
        let frame = match message.to_wire() {
            Ok(json) => Arc::new(json),
            Err(e) => {
                warn!(code = %self.code, error = %e, "failed to serialize message");
                return 0;
            }
        };

        let mut subs = self.subscribers.lock();
        let mut delivered = 0usize;
        let mut evict: Vec<ConnectionId> = Vec::new();
        for sub in subs.values() {
            if !message.should_deliver(sub.origin()) {
                continue;
            }
            if sub.send(Arc::clone(&frame)) {
                delivered += 1;
            } else {
                counter!("channel_delivery_drops_total").increment(1);
                if sub.is_closed() {
                    let err = TransportError {
                        connection: sub.id.to_string(),
                        reason: "connection closed".into(),
                    };
                    debug!(code = %self.code, error = %err, "removing dead subscriber");
                    evict.push(sub.id.clone());
                } else if sub.drop_count() >= MAX_TOTAL_DROPS {
                    let err = TransportError {
                        connection: sub.id.to_string(),
                        reason: format!("outbound queue full {} times", sub.drop_count()),
                    };
                    warn!(code = %self.code, error = %err, "evicting slow subscriber");
                    evict.push(sub.id.clone());
                }
            }
        }
        for id in &evict {
            let _ = subs.remove(id);
        }
        debug!(code = %self.code, delivered, "published message");
        delivered
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
