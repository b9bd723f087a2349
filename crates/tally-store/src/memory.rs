//! In-memory [`Repository`] for tests and ephemeral runs.

use std::collections::HashMap;

use parking_lot::RwLock;

use tally_core::estimate::Estimate;
use tally_core::ids::{ItemId, SessionId, UserId};
use tally_core::item::Item;
use tally_core::session::Session;
use tally_core::user::User;

use crate::error::StoreError;
use crate::repository::Repository;

#[derive(Default)]
struct State {
    sessions: HashMap<SessionId, Session>,
    codes: HashMap<String, SessionId>,
    estimates: HashMap<(UserId, ItemId), Estimate>,
}

/// Repository backed by process memory. Everything is lost on drop.
#[derive(Default)]
pub struct MemoryRepository {
    state: RwLock<State>,
}

impl MemoryRepository {
    /// Create an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Repository for MemoryRepository {
    fn find_session_by_code(&self, code: &str) -> Result<Option<Session>, StoreError> {
        let state = self.state.read();
        Ok(state
            .codes
            .get(code)
            .and_then(|id| state.sessions.get(id))
            .cloned())
    }

    fn session_exists(&self, code: &str) -> Result<bool, StoreError> {
        Ok(self.state.read().codes.contains_key(code))
    }

    fn create_session(
        &self,
        code: &str,
        name: &str,
        description: &str,
        scale: &str,
        author: &User,
    ) -> Result<Session, StoreError> {
        let mut state = self.state.write();
        if state.codes.contains_key(code) {
            return Err(StoreError::Conflict(format!("code {code:?} taken")));
        }
        let session = Session::new(code.to_owned(), name, description, scale, author.clone());
        let _ = state.codes.insert(code.to_owned(), session.id.clone());
        let _ = state.sessions.insert(session.id.clone(), session.clone());
        Ok(session)
    }

    fn save_session(&self, session: &Session) -> Result<(), StoreError> {
        let mut state = self.state.write();
        match state.sessions.get_mut(&session.id) {
            Some(existing) => {
                existing.set_name(session.name());
                existing.set_description(session.description());
                existing.set_estimate_scale(session.estimate_scale());
                Ok(())
            }
            None => Err(StoreError::NotFound(format!("session {}", session.code))),
        }
    }

    fn delete_session(&self, session: &Session) -> Result<(), StoreError> {
        let mut state = self.state.write();
        if let Some(removed) = state.sessions.remove(&session.id) {
            let _ = state.codes.remove(&removed.code);
            let item_ids: Vec<ItemId> = removed.items.iter().map(|i| i.id.clone()).collect();
            state.estimates.retain(|(_, item), _| !item_ids.contains(item));
        }
        Ok(())
    }

    fn save_item(&self, item: &Item, position: u32) -> Result<(), StoreError> {
        let mut state = self.state.write();
        let session = state
            .sessions
            .get_mut(&item.session_id)
            .ok_or_else(|| StoreError::NotFound(format!("session {}", item.session_id)))?;
        if let Some(existing) = session.items.iter_mut().find(|i| i.id == item.id) {
            existing.set_title(item.title());
            existing.set_description(item.description());
        } else {
            let at = (position as usize).min(session.items.len());
            session.items.insert(at, item.clone());
        }
        Ok(())
    }

    fn delete_item(&self, item: &ItemId) -> Result<(), StoreError> {
        let mut state = self.state.write();
        for session in state.sessions.values_mut() {
            let _ = session.remove_item(item);
        }
        state.estimates.retain(|(_, id), _| id != item);
        Ok(())
    }

    fn find_estimate(
        &self,
        user: &UserId,
        item: &ItemId,
    ) -> Result<Option<Estimate>, StoreError> {
        Ok(self
            .state
            .read()
            .estimates
            .get(&(user.clone(), item.clone()))
            .cloned())
    }

    fn save_estimate(&self, estimate: &Estimate) -> Result<(), StoreError> {
        let mut state = self.state.write();
        let _ = state.estimates.insert(
            (estimate.user_id.clone(), estimate.item_id.clone()),
            estimate.clone(),
        );
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
