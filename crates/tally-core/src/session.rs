//! Estimation sessions: the shared state a channel protects.

use chrono::{DateTime, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::{
    self, SESSION_DESCRIPTION_MAX_LENGTH, SESSION_NAME_MAX_LENGTH, SESSION_SCALE_MAX_LENGTH,
};
use crate::duration::Duration;
use crate::errors::FormatError;
use crate::ids::{ItemId, SessionId};
use crate::item::Item;
use crate::user::User;

/// One planning-poker collaboration instance, addressed by a short code.
///
/// The `code` is generated before persistence, verified unique against the
/// repository, and immutable afterwards; it is also the session's identity
/// for equality purposes. `items` keeps insertion order, which every
/// broadcast must preserve.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Session identifier.
    pub id: SessionId,
    /// Short shareable code, unique across all sessions.
    pub code: String,
    name: String,
    description: String,
    estimate_scale: String,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// The session author; the only actor allowed to mutate the item list.
    pub author: User,
    /// Ordered item list, insertion order significant.
    pub items: Vec<Item>,
}

impl Session {
    /// Create a session. Name, description and scale are clamped to their
    /// documented limits.
    #[must_use]
    pub fn new(code: String, name: &str, description: &str, scale: &str, author: User) -> Self {
        let mut session = Self {
            id: SessionId::new(),
            code,
            name: String::new(),
            description: String::new(),
            estimate_scale: String::new(),
            created_at: Utc::now(),
            author,
            items: Vec::new(),
        };
        session.set_name(name);
        session.set_description(description);
        session.set_estimate_scale(scale);
        session
    }

    /// The session name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set the name, truncating past [`SESSION_NAME_MAX_LENGTH`] characters.
    pub fn set_name(&mut self, name: &str) {
        self.name = constants::clamp(name, SESSION_NAME_MAX_LENGTH).to_owned();
    }

    /// The session description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Set the description, truncating past
    /// [`SESSION_DESCRIPTION_MAX_LENGTH`] characters.
    pub fn set_description(&mut self, description: &str) {
        self.description =
            constants::clamp(description, SESSION_DESCRIPTION_MAX_LENGTH).to_owned();
    }

    /// The estimate scale specification string, e.g. `"0m 30m 1h 2h"`.
    #[must_use]
    pub fn estimate_scale(&self) -> &str {
        &self.estimate_scale
    }

    /// Set the scale specification, truncating past
    /// [`SESSION_SCALE_MAX_LENGTH`] characters.
    pub fn set_estimate_scale(&mut self, scale: &str) {
        self.estimate_scale = constants::clamp(scale, SESSION_SCALE_MAX_LENGTH).to_owned();
    }

    /// Parse the scale specification into its ordered duration values.
    pub fn scale(&self) -> Result<Vec<Duration>, FormatError> {
        Duration::parse_many(&self.estimate_scale)
    }

    /// Whether `user` moderates this session.
    #[must_use]
    pub fn is_moderator(&self, user: &User) -> bool {
        self.author == *user
    }

    /// Find an item by id.
    #[must_use]
    pub fn item(&self, id: &ItemId) -> Option<&Item> {
        self.items.iter().find(|i| &i.id == id)
    }

    /// Find an item by id, mutably.
    pub fn item_mut(&mut self, id: &ItemId) -> Option<&mut Item> {
        self.items.iter_mut().find(|i| &i.id == id)
    }

    /// Remove an item by id, preserving the order of the rest.
    ///
    /// Returns the removed item, or `None` if the id is unknown.
    pub fn remove_item(&mut self, id: &ItemId) -> Option<Item> {
        let pos = self.items.iter().position(|i| &i.id == id)?;
        Some(self.items.remove(pos))
    }

    /// Generate a random alphanumeric session code of the given length.
    ///
    /// Uniqueness is the caller's concern; see the store's
    /// retry-until-unique generation.
    #[must_use]
    pub fn new_code(length: usize) -> String {
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(length)
            .map(char::from)
            .collect()
    }
}

impl PartialEq for Session {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code
    }
}

impl Eq for Session {}

impl std::hash::Hash for Session {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.code.hash(state);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
