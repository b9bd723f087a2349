//! # tally-server
//!
//! Axum HTTP + WebSocket server for tally.
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `config` | Server configuration |
//! | `identity` | Identity Provider collaborator (who is acting?) |
//! | `actions` | Session action handlers: mutate, persist, publish |
//! | `protocol` | Client command parsing and server reply frames |
//! | `ws` | WebSocket upgrade, subscription lifecycle, heartbeat |
//! | `server` | Router assembly, HTTP handlers, shared state |
//!
//! ## Data Flow
//!
//! A client opens `/session/{code}/ws` → `ws` subscribes the connection to
//! the session's channel and sends a full-state snapshot. Incoming frames
//! are parsed by `protocol` and dispatched to `actions`, which validate,
//! persist through the Repository, and hand exactly one message per
//! mutation to the channel registry for fan-out.

#![deny(unsafe_code)]

pub mod actions;
pub mod config;
pub mod identity;
pub mod protocol;
pub mod server;
pub mod ws;

pub use actions::{ActionError, SessionActions};
pub use config::ServerConfig;
pub use identity::{HeaderIdentity, IdentityProvider};
pub use server::{AppState, TallyServer};
