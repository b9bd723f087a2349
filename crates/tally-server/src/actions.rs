//! Session action handlers.
//!
//! Each action is one request/response with a side-effecting publish:
//! validate → mutate the domain entities through the Repository → hand
//! exactly one message to the channel registry. Mutate-then-publish runs
//! under a per-session lock so overlapping moderator requests can never
//! lose updates; validation and persistence failures return to the acting
//! client before anything is published.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, info, instrument};

use tally_channel::message::{Message, Origin, Payload};
use tally_channel::registry::ChannelRegistry;
use tally_core::constants::SESSION_CODE_MAX_LENGTH;
use tally_core::duration::Duration;
use tally_core::errors::{ConflictError, FormatError, NotFoundError, ValidationError};
use tally_core::estimate::Estimate;
use tally_core::ids::ItemId;
use tally_core::item::Item;
use tally_core::session::Session;
use tally_core::user::User;
use tally_store::{Repository, StoreError, codes};

/// Failure of a single action, reported to the acting client only.
#[derive(Debug, Error)]
pub enum ActionError {
    /// Missing or out-of-range field.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Malformed duration/estimate text.
    #[error(transparent)]
    Format(#[from] FormatError),

    /// Unknown session code or item.
    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    /// Acting user is not allowed to perform this action.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Persistence failure; the action aborts without publishing.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ActionError {
    /// Short machine-readable code for wire error frames.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Format(_) => "format",
            Self::NotFound(_) => "notFound",
            Self::Forbidden(_) => "forbidden",
            Self::Store(_) => "storage",
        }
    }
}

/// The operations a session's participants can invoke.
///
/// Holds the Repository and the channel registry; one instance is shared
/// by every connection.
pub struct SessionActions {
    repo: Arc<dyn Repository>,
    registry: Arc<ChannelRegistry>,
    code_length: usize,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl SessionActions {
    /// Create the action handlers.
    ///
    /// `code_length` is clamped into `1..=32`.
    #[must_use]
    pub fn new(
        repo: Arc<dyn Repository>,
        registry: Arc<ChannelRegistry>,
        code_length: usize,
    ) -> Self {
        Self {
            repo,
            registry,
            code_length: code_length.clamp(1, SESSION_CODE_MAX_LENGTH),
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// The channel registry actions publish through.
    #[must_use]
    pub fn registry(&self) -> &Arc<ChannelRegistry> {
        &self.registry
    }

    /// The repository actions persist through.
    #[must_use]
    pub fn repository(&self) -> &Arc<dyn Repository> {
        &self.repo
    }

    fn session_lock(&self, code: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock();
        Arc::clone(locks.entry(code.to_owned()).or_default())
    }

    /// Create a session with a freshly generated unique code.
    ///
    /// Code collisions are retried internally and never surface; a
    /// concurrent creator losing the insert race regenerates too.
    #[instrument(skip(self, author), fields(author = %author.id))]
    pub fn create_session(
        &self,
        author: &User,
        name: &str,
        description: &str,
        scale: &str,
    ) -> Result<Session, ActionError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::new("name", "must not be empty").into());
        }
        // Reject malformed scales before anything is persisted.
        let _ = Duration::parse_many(scale)?;

        loop {
            let code = codes::generate_unique_code(self.repo.as_ref(), self.code_length)?;
            match self
                .repo
                .create_session(&code, name, description, scale, author)
            {
                Ok(session) => {
                    info!(code = %session.code, "session created");
                    return Ok(session);
                }
                Err(StoreError::Conflict(_)) => {
                    // Lost a concurrent insert race; regenerate.
                    debug!(error = %ConflictError { code }, "retrying code generation");
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Load a session by code.
    pub fn find_session(&self, code: &str) -> Result<Session, ActionError> {
        self.repo
            .find_session_by_code(code)?
            .ok_or_else(|| NotFoundError::session(code).into())
    }

    fn moderated_session(&self, actor: &User, code: &str) -> Result<Session, ActionError> {
        let session = self.find_session(code)?;
        if !session.is_moderator(actor) {
            return Err(ActionError::Forbidden(
                "only the session author can change items".into(),
            ));
        }
        Ok(session)
    }

    /// Append an item to the session's list (moderator only).
    ///
    /// Publishes `itemAdd` to every subscriber, the moderator's own
    /// connections included; their view was already updated by the
    /// synchronous response, and re-applying an add keyed by item id is
    /// harmless.
    #[instrument(skip(self, actor, description), fields(actor = %actor.id))]
    pub fn add_item(
        &self,
        actor: &User,
        code: &str,
        title: &str,
        description: &str,
    ) -> Result<Item, ActionError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ValidationError::new("title", "must not be empty").into());
        }

        let lock = self.session_lock(code);
        let _guard = lock.lock();

        let session = self.moderated_session(actor, code)?;
        let item = Item::new(session.id.clone(), title, description);
        let position = u32::try_from(session.items.len()).unwrap_or(u32::MAX);
        self.repo.save_item(&item, position)?;

        let _ = self.registry.publish(
            code,
            &Message::new(
                Origin::User(actor.id.clone()),
                Payload::ItemAdded { item: item.clone() },
            ),
        );
        Ok(item)
    }

    /// Change an item's title/description (moderator only).
    ///
    /// Publishes `itemEdit` under exclude-self: the editor already sees the
    /// change through the synchronous response.
    #[instrument(skip(self, actor, title, description), fields(actor = %actor.id, item = %item_id))]
    pub fn edit_item(
        &self,
        actor: &User,
        code: &str,
        item_id: &ItemId,
        title: &str,
        description: &str,
    ) -> Result<Item, ActionError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ValidationError::new("title", "must not be empty").into());
        }

        let lock = self.session_lock(code);
        let _guard = lock.lock();

        let mut session = self.moderated_session(actor, code)?;
        let position = session
            .items
            .iter()
            .position(|i| &i.id == item_id)
            .ok_or_else(|| NotFoundError::item(item_id.as_str()))?;
        let item = {
            let item = &mut session.items[position];
            item.set_title(title);
            item.set_description(description);
            item.clone()
        };
        self.repo
            .save_item(&item, u32::try_from(position).unwrap_or(u32::MAX))?;

        let _ = self.registry.publish(
            code,
            &Message::new(
                Origin::User(actor.id.clone()),
                Payload::ItemEdited { item: item.clone() },
            ),
        );
        Ok(item)
    }

    /// Remove an item (moderator only).
    ///
    /// Publishes `itemRemove` with no origin: every client, the remover's
    /// included, must reconcile its list.
    #[instrument(skip(self, actor), fields(actor = %actor.id, item = %item_id))]
    pub fn remove_item(
        &self,
        actor: &User,
        code: &str,
        item_id: &ItemId,
    ) -> Result<Item, ActionError> {
        let lock = self.session_lock(code);
        let _guard = lock.lock();

        let mut session = self.moderated_session(actor, code)?;
        let item = session
            .remove_item(item_id)
            .ok_or_else(|| NotFoundError::item(item_id.as_str()))?;
        self.repo.delete_item(item_id)?;

        let _ = self.registry.publish(
            code,
            &Message::new(Origin::None, Payload::ItemRemoved { item: item.clone() }),
        );
        Ok(item)
    }

    /// Record the acting user's estimate for an item (idempotent replace).
    ///
    /// Estimates are private: nothing is published.
    #[instrument(skip(self, actor, value), fields(actor = %actor.id, item = %item_id))]
    pub fn approve_estimate(
        &self,
        actor: &User,
        code: &str,
        item_id: &ItemId,
        value: &str,
    ) -> Result<Estimate, ActionError> {
        let session = self.find_session(code)?;
        if session.item(item_id).is_none() {
            return Err(NotFoundError::item(item_id.as_str()).into());
        }
        let value = Duration::parse_one(value.trim())?;

        let estimate = match self.repo.find_estimate(&actor.id, item_id)? {
            Some(mut existing) => {
                existing.value = value;
                existing
            }
            None => Estimate::new(actor.id.clone(), item_id.clone(), value),
        };
        self.repo.save_estimate(&estimate)?;
        Ok(estimate)
    }

    /// Broadcast a chat line to the session. Chat is never persisted.
    #[instrument(skip(self, origin, author_name, message))]
    pub fn send_chat(
        &self,
        origin: Origin,
        author_name: &str,
        code: &str,
        message: &str,
    ) -> Result<usize, ActionError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(ValidationError::new("message", "must not be empty").into());
        }
        if !self.repo.session_exists(code)? {
            return Err(NotFoundError::session(code).into());
        }
        Ok(self.registry.publish(
            code,
            &Message::new(
                origin,
                Payload::Chat {
                    author: author_name.to_owned(),
                    message: message.to_owned(),
                },
            ),
        ))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
