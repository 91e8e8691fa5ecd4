//! User registry operations (users)

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, Result as SqliteResult};
use uuid::Uuid;

use super::super::Database;
use crate::models::User;

impl Database {
    /// Return the user mapped to `external_id`, creating one if missing.
    /// The same external id always yields the same internal handle.
    pub fn get_or_create_user(&self, external_id: &str) -> SqliteResult<User> {
        if let Some(user) = self.get_user_by_external_id(external_id)? {
            return Ok(user);
        }

        let conn = self.conn();
        let id = Uuid::new_v4();
        let now = Utc::now().to_rfc3339();

        // INSERT OR IGNORE covers the race where two requests resolve the
        // same external id concurrently; the re-read below returns whichever
        // row won.
        conn.execute(
            "INSERT OR IGNORE INTO users (id, external_id, created_at) VALUES (?1, ?2, ?3)",
            rusqlite::params![id.to_string(), external_id, &now],
        )?;
        drop(conn);

        log::info!("Created user mapping for external_id={}", external_id);
        self.get_user_by_external_id(external_id)?
            .ok_or(rusqlite::Error::QueryReturnedNoRows)
    }

    pub fn get_user_by_external_id(&self, external_id: &str) -> SqliteResult<Option<User>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, external_id, display_name, created_at FROM users WHERE external_id = ?1",
            [external_id],
            Self::row_to_user,
        )
        .optional()
    }

    pub fn get_user(&self, id: Uuid) -> SqliteResult<Option<User>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, external_id, display_name, created_at FROM users WHERE id = ?1",
            [id.to_string()],
            Self::row_to_user,
        )
        .optional()
    }

    pub fn set_user_display_name(&self, id: Uuid, display_name: &str) -> SqliteResult<bool> {
        let conn = self.conn();
        let rows = conn.execute(
            "UPDATE users SET display_name = ?1 WHERE id = ?2",
            rusqlite::params![display_name, id.to_string()],
        )?;
        Ok(rows > 0)
    }

    fn row_to_user(row: &rusqlite::Row) -> rusqlite::Result<User> {
        let id_str: String = row.get(0)?;
        let created_at_str: String = row.get(3)?;

        Ok(User {
            id: Uuid::parse_str(&id_str).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    0,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?,
            external_id: row.get(1)?,
            display_name: row.get(2)?,
            created_at: parse_utc(&created_at_str, 3)?,
        })
    }
}

/// Parse an RFC 3339 column into `DateTime<Utc>`, mapping failure to a
/// rusqlite conversion error instead of panicking.
pub(crate) fn parse_utc(s: &str, col: usize) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(col, rusqlite::types::Type::Text, Box::new(e))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_or_create_user_is_stable() {
        let db = Database::new(":memory:").unwrap();

        let first = db.get_or_create_user("alice").unwrap();
        let second = db.get_or_create_user("alice").unwrap();
        assert_eq!(first.id, second.id);

        let other = db.get_or_create_user("bob").unwrap();
        assert_ne!(first.id, other.id);
    }

    #[test]
    fn test_get_user_by_id() {
        let db = Database::new(":memory:").unwrap();
        let user = db.get_or_create_user("alice").unwrap();

        let fetched = db.get_user(user.id).unwrap().unwrap();
        assert_eq!(fetched.external_id, "alice");

        assert!(db.get_user(Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn test_set_display_name() {
        let db = Database::new(":memory:").unwrap();
        let user = db.get_or_create_user("alice").unwrap();

        assert!(db.set_user_display_name(user.id, "Alice").unwrap());
        let fetched = db.get_user(user.id).unwrap().unwrap();
        assert_eq!(fetched.display_name.as_deref(), Some("Alice"));
    }
}
