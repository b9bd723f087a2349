//! # tally-store
//!
//! The Repository collaborator for tally: durable storage of sessions,
//! items and estimates, keyed by id or session code.
//!
//! - [`Repository`]: the contract consumed by the action handlers
//! - [`SqliteRepository`]: file-backed (or in-memory) SQLite implementation
//! - [`MemoryRepository`]: plain in-memory implementation for tests and
//!   ephemeral runs
//! - [`codes::generate_unique_code`]: session-code generation with
//!   retry-until-unique against the repository
//!
//! Chat and channel messages are never stored here; they are ephemeral by
//! design.

#![deny(unsafe_code)]

pub mod codes;
mod database;
mod error;
mod memory;
mod repository;
mod schema;
mod sqlite;

pub use database::Database;
pub use error::StoreError;
pub use memory::MemoryRepository;
pub use repository::Repository;
pub use sqlite::SqliteRepository;
