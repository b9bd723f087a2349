//! # tally-channel
//!
//! The real-time core of tally: per-session publish/subscribe channels.
//!
//! - [`message`]: the tagged-union [`message::Message`] envelope, its
//!   server-local [`message::Origin`] and per-kind delivery policies
//! - [`subscriber`]: one registered recipient (a connection's outbound
//!   queue plus its origin identity)
//! - [`channel`]: a single session's fan-out unit with FIFO publish order
//! - [`registry`]: the code → channel map with lazy creation and
//!   empty-channel reclamation
//!
//! Messages are ephemeral: created by an action handler, fanned out once,
//! never queued or replayed. Clients that missed updates reload full state
//! from the repository on reconnect.

#![deny(unsafe_code)]

pub mod channel;
pub mod message;
pub mod registry;
pub mod subscriber;

pub use channel::Channel;
pub use message::{DeliveryPolicy, Message, Origin, Payload};
pub use registry::ChannelRegistry;
pub use subscriber::Subscriber;
