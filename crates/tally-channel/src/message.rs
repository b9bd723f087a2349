//! The channel message model.
//!
//! Every state-changing action publishes exactly one [`Message`]: a wire
//! payload plus a server-local [`Origin`] used only to decide echo
//! suppression at fan-out time. The origin is never serialized; recipients
//! see the payload's `type` discriminator and fields only.

use serde::{Deserialize, Serialize};

use tally_core::ids::{ConnectionId, UserId};
use tally_core::item::Item;

/// Identifies the browsing context a message originated from.
///
/// Moderator actions carry the acting user; anonymous contexts carry their
/// connection id. `None` marks messages that deliberately have no origin
/// (everyone must apply them, originator included).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Origin {
    /// The acting authenticated user.
    User(UserId),
    /// An anonymous per-connection identity.
    Connection(ConnectionId),
    /// No origin; never matches a recipient.
    None,
}

/// How a message's origin is applied when choosing recipients.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeliveryPolicy {
    /// Deliver to every subscriber, the originator included.
    All,
    /// Withhold from subscribers whose origin matches the message origin
    /// (the originating client already applied the change locally).
    ExcludeOrigin,
}

/// Wire payload, one variant per message kind.
///
/// The `type` names are the wire contract; item payloads carry the full
/// affected item.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Payload {
    /// Free-text chat, never persisted.
    #[serde(rename = "chatMsg")]
    Chat {
        /// Display name of the sender.
        author: String,
        /// The chat text.
        message: String,
    },
    /// An item was appended to the session's list.
    #[serde(rename = "itemAdd")]
    ItemAdded {
        /// The new item.
        item: Item,
    },
    /// An item's title or description changed.
    #[serde(rename = "itemEdit")]
    ItemEdited {
        /// The item after the edit.
        item: Item,
    },
    /// An item was removed from the list.
    #[serde(rename = "itemRemove")]
    ItemRemoved {
        /// The removed item.
        item: Item,
    },
}

impl Payload {
    /// The delivery policy for this message kind.
    ///
    /// Edits exclude the editor (their view already shows the change);
    /// everything else goes to all subscribers. Item adds deliberately
    /// include the originating moderator: the add is idempotent client-side
    /// because items are keyed by id.
    #[must_use]
    pub fn delivery_policy(&self) -> DeliveryPolicy {
        match self {
            Payload::ItemEdited { .. } => DeliveryPolicy::ExcludeOrigin,
            Payload::Chat { .. } | Payload::ItemAdded { .. } | Payload::ItemRemoved { .. } => {
                DeliveryPolicy::All
            }
        }
    }
}

/// A message travelling through one session channel.
#[derive(Clone, Debug, PartialEq)]
pub struct Message {
    /// Server-local routing hint; never serialized.
    pub origin: Origin,
    /// The wire payload.
    pub payload: Payload,
}

impl Message {
    /// Create a message.
    #[must_use]
    pub fn new(origin: Origin, payload: Payload) -> Self {
        Self { origin, payload }
    }

    /// Serialize the wire form (payload only, origin omitted).
    pub fn to_wire(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.payload)
    }

    /// Decide delivery for a candidate recipient.
    ///
    /// Pure and O(1): a single origin comparison per (message, recipient)
    /// pair.
    #[must_use]
    pub fn should_deliver(&self, recipient: &Origin) -> bool {
        match self.payload.delivery_policy() {
            DeliveryPolicy::All => true,
            DeliveryPolicy::ExcludeOrigin => {
                self.origin == Origin::None || self.origin != *recipient
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::ids::SessionId;

    fn item() -> Item {
        Item::new(SessionId::from("s1"), "Login page", "the login flow")
    }

    #[test]
    fn chat_wire_form() {
        let msg = Message::new(
            Origin::User(UserId::from("u1")),
            Payload::Chat {
                author: "Alice".into(),
                message: "hello".into(),
            },
        );
        let wire: serde_json::Value = serde_json::from_str(&msg.to_wire().unwrap()).unwrap();
        assert_eq!(wire["type"], "chatMsg");
        assert_eq!(wire["author"], "Alice");
        assert_eq!(wire["message"], "hello");
    }

    #[test]
    fn item_wire_forms_use_original_type_names() {
        for (payload, expected) in [
            (Payload::ItemAdded { item: item() }, "itemAdd"),
            (Payload::ItemEdited { item: item() }, "itemEdit"),
            (Payload::ItemRemoved { item: item() }, "itemRemove"),
        ] {
            let msg = Message::new(Origin::None, payload);
            let wire: serde_json::Value =
                serde_json::from_str(&msg.to_wire().unwrap()).unwrap();
            assert_eq!(wire["type"], expected);
            assert_eq!(wire["item"]["title"], "Login page");
        }
    }

    #[test]
    fn origin_is_never_on_the_wire() {
        let msg = Message::new(
            Origin::User(UserId::from("secret-user")),
            Payload::Chat {
                author: "A".into(),
                message: "m".into(),
            },
        );
        let wire = msg.to_wire().unwrap();
        assert!(!wire.contains("origin"));
        assert!(!wire.contains("secret-user"));
    }

    #[test]
    fn edit_excludes_matching_origin() {
        let editor = Origin::User(UserId::from("mod"));
        let msg = Message::new(editor.clone(), Payload::ItemEdited { item: item() });
        assert!(!msg.should_deliver(&editor));
        assert!(msg.should_deliver(&Origin::User(UserId::from("other"))));
        assert!(msg.should_deliver(&Origin::Connection(ConnectionId::from("c1"))));
    }

    #[test]
    fn remove_delivers_to_everyone_including_origin() {
        let msg = Message::new(Origin::None, Payload::ItemRemoved { item: item() });
        assert!(msg.should_deliver(&Origin::User(UserId::from("mod"))));
        assert!(msg.should_deliver(&Origin::Connection(ConnectionId::from("c1"))));
        assert!(msg.should_deliver(&Origin::None));
    }

    #[test]
    fn add_delivers_to_originator_too() {
        let origin = Origin::User(UserId::from("mod"));
        let msg = Message::new(origin.clone(), Payload::ItemAdded { item: item() });
        assert!(msg.should_deliver(&origin));
    }

    #[test]
    fn chat_delivers_to_sender() {
        let origin = Origin::Connection(ConnectionId::from("c7"));
        let msg = Message::new(
            origin.clone(),
            Payload::Chat {
                author: "A".into(),
                message: "hi".into(),
            },
        );
        assert!(msg.should_deliver(&origin));
    }

    #[test]
    fn exclude_origin_with_none_origin_delivers_everywhere() {
        let msg = Message::new(Origin::None, Payload::ItemEdited { item: item() });
        assert!(msg.should_deliver(&Origin::None));
        assert!(msg.should_deliver(&Origin::User(UserId::from("u"))));
    }

    #[test]
    fn payload_round_trips() {
        let payload = Payload::ItemAdded { item: item() };
        let json = serde_json::to_string(&payload).unwrap();
        let back: Payload = serde_json::from_str(&json).unwrap();
        assert_eq!(back, payload);
    }
}
