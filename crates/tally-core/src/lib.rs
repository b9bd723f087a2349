//! # tally-core
//!
//! Foundation types for the tally planning-poker server.
//!
//! This crate provides the shared vocabulary the other tally crates depend
//! on:
//!
//! - **Branded IDs**: [`ids::SessionId`], [`ids::ItemId`], [`ids::UserId`],
//!   [`ids::ConnectionId`] as newtypes over UUID v7 strings
//! - **Durations**: [`duration::Duration`] — the estimate value, a minute
//!   count with a compact `30m 2h 1d 1w` textual form
//! - **Entities**: [`session::Session`], [`item::Item`],
//!   [`estimate::Estimate`], [`user::User`]
//! - **Errors**: the taxonomy in [`errors`] (`FormatError`,
//!   `ValidationError`, `NotFoundError`, `ConflictError`, `TransportError`)
//! - **Constants**: field length limits in [`constants`]
//!
//! ## Crate Position
//!
//! Foundation crate. Depended on by all other tally crates.

#![deny(unsafe_code)]

pub mod constants;
pub mod duration;
pub mod errors;
pub mod estimate;
pub mod ids;
pub mod item;
pub mod session;
pub mod user;

pub use duration::Duration;
pub use errors::{ConflictError, FormatError, NotFoundError, TransportError, ValidationError};
