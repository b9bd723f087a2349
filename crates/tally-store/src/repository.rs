//! The Repository contract consumed by the action handlers.

use tally_core::estimate::Estimate;
use tally_core::ids::{ItemId, UserId};
use tally_core::item::Item;
use tally_core::session::Session;
use tally_core::user::User;

use crate::error::StoreError;

/// Durable storage for sessions, items and estimates.
///
/// Implementations must be safe to call from concurrent request handlers.
/// Calls are synchronous and short; callers serialize mutate-then-publish
/// sequences themselves (per-session locking lives with the handlers, not
/// here).
pub trait Repository: Send + Sync {
    /// Load a session (with its ordered items) by code.
    fn find_session_by_code(&self, code: &str) -> Result<Option<Session>, StoreError>;

    /// Whether a session with this code exists.
    fn session_exists(&self, code: &str) -> Result<bool, StoreError>;

    /// Persist a new session under an already-generated code.
    ///
    /// Fails with [`StoreError::Conflict`] if the code is already taken.
    fn create_session(
        &self,
        code: &str,
        name: &str,
        description: &str,
        scale: &str,
        author: &User,
    ) -> Result<Session, StoreError>;

    /// Persist changed session fields (not the item list).
    fn save_session(&self, session: &Session) -> Result<(), StoreError>;

    /// Delete a session and everything it owns.
    fn delete_session(&self, session: &Session) -> Result<(), StoreError>;

    /// Insert or update an item at the given position in its session.
    fn save_item(&self, item: &Item, position: u32) -> Result<(), StoreError>;

    /// Delete an item and its estimates.
    fn delete_item(&self, item: &ItemId) -> Result<(), StoreError>;

    /// Look up the estimate one user gave one item.
    fn find_estimate(&self, user: &UserId, item: &ItemId)
        -> Result<Option<Estimate>, StoreError>;

    /// Insert or replace an estimate (keyed by user + item).
    fn save_estimate(&self, estimate: &Estimate) -> Result<(), StoreError>;
}
