//! Users as the collaboration engine sees them.
//!
//! Identity and authentication live outside this repository; an Identity
//! Provider hands the engine a resolved [`User`] per request. Equality and
//! hashing go by the provider-issued external ID.

use serde::{Deserialize, Serialize};

use crate::constants::{self, USER_NAME_MAX_LENGTH};
use crate::ids::UserId;

/// A reference to an authenticated user.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Internal identifier.
    pub id: UserId,
    /// Identifier issued by the identity provider, unique per user.
    pub external_id: String,
    /// Display name, clamped to [`USER_NAME_MAX_LENGTH`].
    display_name: String,
}

impl User {
    /// Create a user reference.
    #[must_use]
    pub fn new(id: UserId, external_id: impl Into<String>, display_name: &str) -> Self {
        Self {
            id,
            external_id: external_id.into(),
            display_name: constants::clamp(display_name, USER_NAME_MAX_LENGTH).to_owned(),
        }
    }

    /// The user's display name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }
}

impl PartialEq for User {
    fn eq(&self, other: &Self) -> bool {
        self.external_id == other.external_id
    }
}

impl Eq for User {}

impl std::hash::Hash for User {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.external_id.hash(state);
    }
}
