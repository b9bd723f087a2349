//! The session-code → channel map.
//!
//! One registry instance is created at server start and handed to the
//! action handlers and the push transport; there is no process-global
//! state. Channels are created lazily on first subscription and reclaimed
//! once their last subscriber detaches (a later subscribe simply creates a
//! fresh one).

use std::collections::HashMap;
use std::sync::Arc;

use metrics::gauge;
use parking_lot::RwLock;
use tracing::debug;

use tally_core::ids::ConnectionId;

use crate::channel::Channel;
use crate::message::Message;
use crate::subscriber::Subscriber;

/// Owns the 1:1 mapping from session code to live channel.
#[derive(Default)]
pub struct ChannelRegistry {
    channels: RwLock<HashMap<String, Arc<Channel>>>,
}

impl ChannelRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the channel for `code`, creating it if absent.
    ///
    /// Concurrent callers for the same code all observe the same channel
    /// instance: creation happens under the write lock, and a loser of the
    /// race finds the winner's entry.
    pub fn lookup_or_create(&self, code: &str) -> Arc<Channel> {
        if let Some(channel) = self.channels.read().get(code) {
            return Arc::clone(channel);
        }
        let mut channels = self.channels.write();
        let channel = Arc::clone(channels.entry(code.to_owned()).or_insert_with(|| {
            debug!(code, "creating channel");
            Arc::new(Channel::new(code))
        }));
        gauge!("channels_active").set(channels.len() as f64);
        channel
    }

    /// Subscribe a connection to the channel for `code`, creating the
    /// channel if needed. Idempotent per connection.
    pub fn subscribe(&self, code: &str, subscriber: Arc<Subscriber>) -> Arc<Channel> {
        let channel = self.lookup_or_create(code);
        channel.subscribe(subscriber);
        channel
    }

    /// Detach a connection from the channel for `code`. When the last
    /// subscriber leaves, the channel is dropped from the registry.
    pub fn unsubscribe(&self, code: &str, connection: &ConnectionId) {
        let emptied = {
            let channels = self.channels.read();
            match channels.get(code) {
                Some(channel) => {
                    let _ = channel.unsubscribe(connection);
                    channel.is_empty()
                }
                None => false,
            }
        };
        if emptied {
            let mut channels = self.channels.write();
            // Re-check under the write lock: someone may have subscribed
            // between the two lock acquisitions.
            if channels.get(code).is_some_and(|c| c.is_empty()) {
                let _ = channels.remove(code);
                debug!(code, "reclaimed empty channel");
            }
            gauge!("channels_active").set(channels.len() as f64);
        }
    }

    /// Publish to the channel for `code`.
    ///
    /// A code with no live channel has provably no subscribers, so the
    /// publish is a silent no-op. Returns the number of deliveries.
    pub fn publish(&self, code: &str, message: &Message) -> usize {
        let channel = {
            let channels = self.channels.read();
            channels.get(code).map(Arc::clone)
        };
        match channel {
            Some(channel) => channel.publish(message),
            None => 0,
        }
    }

    /// Number of live channels.
    #[must_use]
    pub fn channel_count(&self) -> usize {
        self.channels.read().len()
    }

    /// Subscriber count for `code` (0 if no channel).
    #[must_use]
    pub fn subscriber_count(&self, code: &str) -> usize {
        self.channels
            .read()
            .get(code)
            .map_or(0, |c| c.subscriber_count())
    }

    /// Total subscribers across all channels.
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.channels
            .read()
            .values()
            .map(|c| c.subscriber_count())
            .sum()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
