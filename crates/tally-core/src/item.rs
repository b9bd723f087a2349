//! Work items estimated during a session.

use serde::{Deserialize, Serialize};

use crate::constants::{self, ITEM_DESCRIPTION_MAX_LENGTH, ITEM_TITLE_MAX_LENGTH};
use crate::ids::{ItemId, SessionId};

/// A work item on a session's estimation list.
///
/// Created, edited and removed only through the moderator action handlers.
/// Equality is by `id`: two items with the same text are still distinct
/// entries on the list.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    /// Item identifier.
    pub id: ItemId,
    /// Owning session.
    pub session_id: SessionId,
    title: String,
    description: String,
}

impl Item {
    /// Create an item. Title and description are clamped to their limits.
    #[must_use]
    pub fn new(session_id: SessionId, title: &str, description: &str) -> Self {
        let mut item = Self {
            id: ItemId::new(),
            session_id,
            title: String::new(),
            description: String::new(),
        };
        item.set_title(title);
        item.set_description(description);
        item
    }

    /// The item title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Set the title, truncating past [`ITEM_TITLE_MAX_LENGTH`] characters.
    pub fn set_title(&mut self, title: &str) {
        self.title = constants::clamp(title, ITEM_TITLE_MAX_LENGTH).to_owned();
    }

    /// The item description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Set the description, truncating past
    /// [`ITEM_DESCRIPTION_MAX_LENGTH`] characters.
    pub fn set_description(&mut self, description: &str) {
        self.description =
            constants::clamp(description, ITEM_DESCRIPTION_MAX_LENGTH).to_owned();
    }
}

impl PartialEq for Item {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Item {}

impl std::hash::Hash for Item {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_clamps_overlong_fields() {
        let item = Item::new(
            SessionId::new(),
            &"t".repeat(ITEM_TITLE_MAX_LENGTH + 50),
            &"d".repeat(ITEM_DESCRIPTION_MAX_LENGTH + 50),
        );
        assert_eq!(item.title().chars().count(), ITEM_TITLE_MAX_LENGTH);
        assert_eq!(
            item.description().chars().count(),
            ITEM_DESCRIPTION_MAX_LENGTH
        );
    }

    #[test]
    fn equality_is_by_id() {
        let session = SessionId::new();
        let a = Item::new(session.clone(), "Login page", "");
        let b = Item::new(session, "Login page", "");
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn edit_replaces_fields() {
        let mut item = Item::new(SessionId::new(), "old", "old desc");
        item.set_title("new");
        item.set_description("");
        assert_eq!(item.title(), "new");
        assert_eq!(item.description(), "");
    }

    #[test]
    fn serializes_camel_case() {
        let item = Item::new(SessionId::from("s1"), "Login page", "the login flow");
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["sessionId"], "s1");
        assert_eq!(json["title"], "Login page");
        assert_eq!(json["description"], "the login flow");
    }
}
