//! SQLite-backed [`Repository`].

use chrono::{DateTime, Utc};
use tracing::instrument;

use tally_core::duration::Duration;
use tally_core::estimate::Estimate;
use tally_core::ids::{ItemId, SessionId, UserId};
use tally_core::item::Item;
use tally_core::session::Session;
use tally_core::user::User;

use crate::database::Database;
use crate::error::StoreError;
use crate::repository::Repository;

/// Repository over a [`Database`].
#[derive(Clone)]
pub struct SqliteRepository {
    db: Database,
}

impl SqliteRepository {
    /// Create a repository over an open database.
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn load_items(
        conn: &rusqlite::Connection,
        session_id: &SessionId,
    ) -> Result<Vec<Item>, StoreError> {
        let mut stmt = conn.prepare(
            "SELECT id, title, description FROM items
             WHERE session_id = ?1 ORDER BY position",
        )?;
        let rows = stmt.query_map([session_id.as_str()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;
        let mut items = Vec::new();
        for row in rows {
            let (id, title, description) = row?;
            let mut item = Item::new(session_id.clone(), &title, &description);
            item.id = ItemId::from(id);
            items.push(item);
        }
        Ok(items)
    }
}

impl Repository for SqliteRepository {
    #[instrument(skip(self))]
    fn find_session_by_code(&self, code: &str) -> Result<Option<Session>, StoreError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, code, name, description, estimate_scale,
                        author_id, author_external_id, author_name, created_at
                 FROM sessions WHERE code = ?1",
            )?;
            let mut rows = stmt.query([code])?;
            let Some(row) = rows.next()? else {
                return Ok(None);
            };
            let id: String = row.get(0)?;
            let code: String = row.get(1)?;
            let name: String = row.get(2)?;
            let description: String = row.get(3)?;
            let scale: String = row.get(4)?;
            let author = User::new(
                UserId::from(row.get::<_, String>(5)?),
                row.get::<_, String>(6)?,
                &row.get::<_, String>(7)?,
            );
            let created_at: String = row.get(8)?;

            let mut session = Session::new(code, &name, &description, &scale, author);
            session.id = SessionId::from(id);
            session.created_at = created_at
                .parse::<DateTime<Utc>>()
                .map_err(|e| StoreError::Database(format!("created_at: {e}")))?;
            session.items = Self::load_items(conn, &session.id)?;
            Ok(Some(session))
        })
    }

    fn session_exists(&self, code: &str) -> Result<bool, StoreError> {
        self.db.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM sessions WHERE code = ?1",
                [code],
                |row| row.get(0),
            )?;
            Ok(count != 0)
        })
    }

    #[instrument(skip(self, author), fields(author = %author.id))]
    fn create_session(
        &self,
        code: &str,
        name: &str,
        description: &str,
        scale: &str,
        author: &User,
    ) -> Result<Session, StoreError> {
        let session = Session::new(code.to_owned(), name, description, scale, author.clone());
        self.db.with_conn(|conn| {
            let _ = conn.execute(
                "INSERT INTO sessions
                   (id, code, name, description, estimate_scale,
                    author_id, author_external_id, author_name, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                rusqlite::params![
                    session.id.as_str(),
                    session.code,
                    session.name(),
                    session.description(),
                    session.estimate_scale(),
                    author.id.as_str(),
                    author.external_id,
                    author.display_name(),
                    session.created_at.to_rfc3339(),
                ],
            )?;
            Ok(())
        })?;
        Ok(session)
    }

    fn save_session(&self, session: &Session) -> Result<(), StoreError> {
        self.db.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE sessions SET name = ?2, description = ?3, estimate_scale = ?4
                 WHERE id = ?1",
                rusqlite::params![
                    session.id.as_str(),
                    session.name(),
                    session.description(),
                    session.estimate_scale(),
                ],
            )?;
            if changed == 0 {
                return Err(StoreError::NotFound(format!("session {}", session.code)));
            }
            Ok(())
        })
    }

    fn delete_session(&self, session: &Session) -> Result<(), StoreError> {
        self.db.with_conn(|conn| {
            let _ = conn.execute(
                "DELETE FROM sessions WHERE id = ?1",
                [session.id.as_str()],
            )?;
            Ok(())
        })
    }

    fn save_item(&self, item: &Item, position: u32) -> Result<(), StoreError> {
        self.db.with_conn(|conn| {
            let _ = conn.execute(
                "INSERT INTO items (id, session_id, position, title, description)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(id) DO UPDATE SET
                   position = excluded.position,
                   title = excluded.title,
                   description = excluded.description",
                rusqlite::params![
                    item.id.as_str(),
                    item.session_id.as_str(),
                    position,
                    item.title(),
                    item.description(),
                ],
            )?;
            Ok(())
        })
    }

    fn delete_item(&self, item: &ItemId) -> Result<(), StoreError> {
        self.db.with_conn(|conn| {
            let _ = conn.execute("DELETE FROM items WHERE id = ?1", [item.as_str()])?;
            Ok(())
        })
    }

    fn find_estimate(
        &self,
        user: &UserId,
        item: &ItemId,
    ) -> Result<Option<Estimate>, StoreError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT minutes FROM estimates WHERE user_id = ?1 AND item_id = ?2",
            )?;
            let mut rows = stmt.query([user.as_str(), item.as_str()])?;
            match rows.next()? {
                Some(row) => {
                    let minutes: i64 = row.get(0)?;
                    let value = Duration::try_from_minutes(minutes)
                        .map_err(|e| StoreError::Database(e.to_string()))?;
                    Ok(Some(Estimate::new(user.clone(), item.clone(), value)))
                }
                None => Ok(None),
            }
        })
    }

    fn save_estimate(&self, estimate: &Estimate) -> Result<(), StoreError> {
        self.db.with_conn(|conn| {
            let _ = conn.execute(
                "INSERT INTO estimates (user_id, item_id, minutes) VALUES (?1, ?2, ?3)
                 ON CONFLICT(user_id, item_id) DO UPDATE SET minutes = excluded.minutes",
                rusqlite::params![
                    estimate.user_id.as_str(),
                    estimate.item_id.as_str(),
                    i64::from(estimate.value.minutes()),
                ],
            )?;
            Ok(())
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn repo() -> SqliteRepository {
        SqliteRepository::new(Database::in_memory().unwrap())
    }

    fn author() -> User {
        User::new(UserId::new(), "mod-1", "Moderator")
    }

    #[test]
    fn create_and_find_by_code() {
        let repo = repo();
        let created = repo
            .create_session("a1B2c3D4e5", "Sprint 1", "first sprint", "0m 30m 1h", &author())
            .unwrap();
        let found = repo.find_session_by_code("a1B2c3D4e5").unwrap().unwrap();
        assert_eq!(found, created);
        assert_eq!(found.name(), "Sprint 1");
        assert_eq!(found.description(), "first sprint");
        assert_eq!(found.estimate_scale(), "0m 30m 1h");
        assert_eq!(found.author.external_id, "mod-1");
        assert!(found.items.is_empty());
    }

    #[test]
    fn find_unknown_code_returns_none() {
        assert!(repo().find_session_by_code("nope").unwrap().is_none());
    }

    #[test]
    fn session_exists() {
        let repo = repo();
        assert!(!repo.session_exists("abc").unwrap());
        let _ = repo
            .create_session("abc", "S", "", "1h", &author())
            .unwrap();
        assert!(repo.session_exists("abc").unwrap());
    }

    #[test]
    fn duplicate_code_is_conflict() {
        let repo = repo();
        let _ = repo
            .create_session("dup", "A", "", "1h", &author())
            .unwrap();
        let err = repo
            .create_session("dup", "B", "", "2h", &author())
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[test]
    fn save_session_updates_fields() {
        let repo = repo();
        let mut session = repo
            .create_session("code1", "Old", "", "1h", &author())
            .unwrap();
        session.set_name("New");
        session.set_description("updated");
        repo.save_session(&session).unwrap();
        let found = repo.find_session_by_code("code1").unwrap().unwrap();
        assert_eq!(found.name(), "New");
        assert_eq!(found.description(), "updated");
    }

    #[test]
    fn save_unknown_session_is_not_found() {
        let repo = repo();
        let session = Session::new("ghost".into(), "G", "", "1h", author());
        assert!(matches!(
            repo.save_session(&session).unwrap_err(),
            StoreError::NotFound(_)
        ));
    }

    #[test]
    fn items_round_trip_in_order() {
        let repo = repo();
        let session = repo
            .create_session("code2", "S", "", "1h", &author())
            .unwrap();
        for (pos, title) in ["first", "second", "third"].iter().enumerate() {
            let item = Item::new(session.id.clone(), title, "");
            repo.save_item(&item, pos as u32).unwrap();
        }
        let found = repo.find_session_by_code("code2").unwrap().unwrap();
        let titles: Vec<&str> = found.items.iter().map(Item::title).collect();
        assert_eq!(titles, vec!["first", "second", "third"]);
    }

    #[test]
    fn save_item_twice_updates_in_place() {
        let repo = repo();
        let session = repo
            .create_session("code3", "S", "", "1h", &author())
            .unwrap();
        let mut item = Item::new(session.id.clone(), "draft", "");
        repo.save_item(&item, 0).unwrap();
        item.set_title("final");
        repo.save_item(&item, 0).unwrap();
        let found = repo.find_session_by_code("code3").unwrap().unwrap();
        assert_eq!(found.items.len(), 1);
        assert_eq!(found.items[0].title(), "final");
    }

    #[test]
    fn delete_item_removes_it_and_its_estimates() {
        let repo = repo();
        let session = repo
            .create_session("code4", "S", "", "1h", &author())
            .unwrap();
        let item = Item::new(session.id.clone(), "x", "");
        repo.save_item(&item, 0).unwrap();
        let user = UserId::new();
        repo.save_estimate(&Estimate::new(
            user.clone(),
            item.id.clone(),
            Duration::from_minutes(60),
        ))
        .unwrap();

        repo.delete_item(&item.id).unwrap();
        let found = repo.find_session_by_code("code4").unwrap().unwrap();
        assert!(found.items.is_empty());
        assert!(repo.find_estimate(&user, &item.id).unwrap().is_none());
    }

    #[test]
    fn delete_session_cascades() {
        let repo = repo();
        let session = repo
            .create_session("code5", "S", "", "1h", &author())
            .unwrap();
        let item = Item::new(session.id.clone(), "x", "");
        repo.save_item(&item, 0).unwrap();
        repo.delete_session(&session).unwrap();
        assert!(repo.find_session_by_code("code5").unwrap().is_none());
        assert!(!repo.session_exists("code5").unwrap());
    }

    #[test]
    fn estimate_upsert_replaces_value() {
        let repo = repo();
        let session = repo
            .create_session("code6", "S", "", "1h", &author())
            .unwrap();
        let item = Item::new(session.id.clone(), "x", "");
        repo.save_item(&item, 0).unwrap();
        let user = UserId::new();

        assert!(repo.find_estimate(&user, &item.id).unwrap().is_none());
        repo.save_estimate(&Estimate::new(
            user.clone(),
            item.id.clone(),
            Duration::from_minutes(60),
        ))
        .unwrap();
        repo.save_estimate(&Estimate::new(
            user.clone(),
            item.id.clone(),
            Duration::from_minutes(120),
        ))
        .unwrap();

        let found = repo.find_estimate(&user, &item.id).unwrap().unwrap();
        assert_eq!(found.value.minutes(), 120);
    }

    #[test]
    fn estimates_are_keyed_per_user() {
        let repo = repo();
        let session = repo
            .create_session("code7", "S", "", "1h", &author())
            .unwrap();
        let item = Item::new(session.id.clone(), "x", "");
        repo.save_item(&item, 0).unwrap();

        let alice = UserId::new();
        let bob = UserId::new();
        repo.save_estimate(&Estimate::new(
            alice.clone(),
            item.id.clone(),
            Duration::from_minutes(60),
        ))
        .unwrap();
        repo.save_estimate(&Estimate::new(
            bob.clone(),
            item.id.clone(),
            Duration::from_minutes(120),
        ))
        .unwrap();

        assert_eq!(
            repo.find_estimate(&alice, &item.id)
                .unwrap()
                .unwrap()
                .value
                .minutes(),
            60
        );
        assert_eq!(
            repo.find_estimate(&bob, &item.id)
                .unwrap()
                .unwrap()
                .value
                .minutes(),
            120
        );
    }

    #[test]
    fn created_at_survives_round_trip() {
        let repo = repo();
        let created = repo
            .create_session("code8", "S", "", "1h", &author())
            .unwrap();
        let found = repo.find_session_by_code("code8").unwrap().unwrap();
        assert_eq!(
            found.created_at.timestamp_millis(),
            created.created_at.timestamp_millis()
        );
    }
}
