//! Client commands and server reply frames.
//!
//! Clients send one JSON command per frame, discriminated by `action`.
//! Replies to the acting client are `ack`/`error` frames; state changes
//! reach everyone else through the channel's broadcast frames (see
//! `tally-channel::message`).

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use tally_core::ids::ItemId;
use tally_core::item::Item;
use tally_core::session::Session;

use crate::actions::ActionError;

/// A command sent by a connected client.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ClientCommand {
    /// Send a chat line to the session.
    Chat {
        /// The chat text.
        message: String,
    },
    /// Append an item (moderator only).
    AddItem {
        /// Item title.
        title: String,
        /// Optional item description.
        #[serde(default)]
        description: String,
    },
    /// Edit an item's text (moderator only).
    EditItem {
        /// Item to edit.
        id: ItemId,
        /// New title.
        title: String,
        /// New description.
        #[serde(default)]
        description: String,
    },
    /// Remove an item (moderator only).
    RemoveItem {
        /// Item to remove.
        id: ItemId,
    },
    /// Submit the acting user's estimate for an item.
    ApproveEstimate {
        /// Item being estimated.
        id: ItemId,
        /// Estimate in duration form, e.g. `"2h"`.
        value: String,
    },
}

impl ClientCommand {
    /// The wire name of this command, echoed back in ack/error frames.
    #[must_use]
    pub fn action_name(&self) -> &'static str {
        match self {
            Self::Chat { .. } => "chat",
            Self::AddItem { .. } => "addItem",
            Self::EditItem { .. } => "editItem",
            Self::RemoveItem { .. } => "removeItem",
            Self::ApproveEstimate { .. } => "approveEstimate",
        }
    }
}

/// The full-state frame sent once when a connection subscribes.
///
/// Estimates are private and deliberately absent.
#[must_use]
pub fn snapshot_frame(session: &Session) -> Value {
    json!({
        "type": "session",
        "session": {
            "code": session.code,
            "name": session.name(),
            "description": session.description(),
            "estimateScale": session.estimate_scale(),
            "author": session.author.display_name(),
            "createdAt": session.created_at.to_rfc3339(),
            "items": session.items,
        },
    })
}

/// Positive reply to the acting client, optionally carrying the affected
/// item so its view updates synchronously.
#[must_use]
pub fn ack_frame(action: &str, item: Option<&Item>) -> Value {
    match item {
        Some(item) => json!({ "type": "ack", "action": action, "item": item }),
        None => json!({ "type": "ack", "action": action }),
    }
}

/// Failure reply, visible to the acting client only.
#[must_use]
pub fn error_frame(action: &str, err: &ActionError) -> Value {
    json!({
        "type": "error",
        "action": action,
        "error": err.code(),
        "message": err.to_string(),
    })
}

/// Failure reply for a frame that could not be parsed at all.
#[must_use]
pub fn parse_error_frame(detail: &str) -> Value {
    json!({
        "type": "error",
        "error": "badRequest",
        "message": detail,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
