//! Chat session operations (chat_sessions, chat_messages)

use chrono::Utc;
use rusqlite::{OptionalExtension, Result as SqliteResult};
use uuid::Uuid;

use super::super::Database;
use super::users::parse_utc;
use crate::models::{ChatMessage, ChatRole, ChatSession};

impl Database {
    /// Get the user's active chat session, creating one if none exists
    pub fn get_or_create_chat_session(&self, user_id: Uuid) -> SqliteResult<ChatSession> {
        if let Some(session) = self.get_active_chat_session(user_id)? {
            return Ok(session);
        }

        let conn = self.conn();
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO chat_sessions (user_id, is_active, created_at, last_activity_at)
             VALUES (?1, 1, ?2, ?2)",
            rusqlite::params![user_id.to_string(), &now],
        )?;
        let id = conn.last_insert_rowid();
        drop(conn);

        log::info!("Created chat session {} for user {}", id, user_id);
        self.get_chat_session(id)?
            .ok_or(rusqlite::Error::QueryReturnedNoRows)
    }

    pub fn get_chat_session(&self, id: i64) -> SqliteResult<Option<ChatSession>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, user_id, is_active, created_at, last_activity_at
             FROM chat_sessions WHERE id = ?1",
            [id],
            Self::row_to_chat_session,
        )
        .optional()
    }

    fn get_active_chat_session(&self, user_id: Uuid) -> SqliteResult<Option<ChatSession>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, user_id, is_active, created_at, last_activity_at
             FROM chat_sessions WHERE user_id = ?1 AND is_active = 1
             ORDER BY id DESC LIMIT 1",
            [user_id.to_string()],
            Self::row_to_chat_session,
        )
        .optional()
    }

    /// Append a message to a session and bump its activity timestamp
    pub fn add_chat_message(
        &self,
        session_id: i64,
        role: ChatRole,
        content: &str,
    ) -> SqliteResult<i64> {
        let conn = self.conn();
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO chat_messages (session_id, role, content, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![session_id, role.as_str(), content, &now],
        )?;
        let id = conn.last_insert_rowid();
        conn.execute(
            "UPDATE chat_sessions SET last_activity_at = ?1 WHERE id = ?2",
            rusqlite::params![&now, session_id],
        )?;
        Ok(id)
    }

    /// Most recent messages in chronological order
    pub fn get_recent_chat_messages(
        &self,
        session_id: i64,
        limit: i64,
    ) -> SqliteResult<Vec<ChatMessage>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, session_id, role, content, created_at FROM (
                 SELECT id, session_id, role, content, created_at
                 FROM chat_messages WHERE session_id = ?1
                 ORDER BY id DESC LIMIT ?2
             ) ORDER BY id ASC",
        )?;

        let messages = stmt
            .query_map(rusqlite::params![session_id, limit], Self::row_to_chat_message)?
            .filter_map(|r| r.ok())
            .collect();

        Ok(messages)
    }

    /// Deactivate the user's current session so the next message starts a
    /// fresh one. Returns true if a session was closed.
    pub fn reset_chat_session(&self, user_id: Uuid) -> SqliteResult<bool> {
        let conn = self.conn();
        let rows = conn.execute(
            "UPDATE chat_sessions SET is_active = 0 WHERE user_id = ?1 AND is_active = 1",
            [user_id.to_string()],
        )?;
        Ok(rows > 0)
    }

    fn row_to_chat_session(row: &rusqlite::Row) -> rusqlite::Result<ChatSession> {
        let user_id_str: String = row.get(1)?;
        let created_at_str: String = row.get(3)?;
        let last_activity_str: String = row.get(4)?;

        Ok(ChatSession {
            id: row.get(0)?,
            user_id: Uuid::parse_str(&user_id_str).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    1,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?,
            is_active: row.get::<_, i64>(2)? != 0,
            created_at: parse_utc(&created_at_str, 3)?,
            last_activity_at: parse_utc(&last_activity_str, 4)?,
        })
    }

    fn row_to_chat_message(row: &rusqlite::Row) -> rusqlite::Result<ChatMessage> {
        let role_str: String = row.get(2)?;
        let created_at_str: String = row.get(4)?;

        Ok(ChatMessage {
            id: row.get(0)?,
            session_id: row.get(1)?,
            role: ChatRole::from_str(&role_str).unwrap_or(ChatRole::User),
            content: row.get(3)?,
            created_at: parse_utc(&created_at_str, 4)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_reuse_and_reset() {
        let db = Database::new(":memory:").unwrap();
        let user = db.get_or_create_user("alice").unwrap();

        let first = db.get_or_create_chat_session(user.id).unwrap();
        let again = db.get_or_create_chat_session(user.id).unwrap();
        assert_eq!(first.id, again.id);

        assert!(db.reset_chat_session(user.id).unwrap());
        let fresh = db.get_or_create_chat_session(user.id).unwrap();
        assert_ne!(first.id, fresh.id);
    }

    #[test]
    fn test_messages_come_back_in_order() {
        let db = Database::new(":memory:").unwrap();
        let user = db.get_or_create_user("alice").unwrap();
        let session = db.get_or_create_chat_session(user.id).unwrap();

        db.add_chat_message(session.id, ChatRole::User, "add a task").unwrap();
        db.add_chat_message(session.id, ChatRole::Assistant, "done").unwrap();
        db.add_chat_message(session.id, ChatRole::User, "thanks").unwrap();

        let messages = db.get_recent_chat_messages(session.id, 10).unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].content, "add a task");
        assert_eq!(messages[0].role, ChatRole::User);
        assert_eq!(messages[1].role, ChatRole::Assistant);
        assert_eq!(messages[2].content, "thanks");

        let last_two = db.get_recent_chat_messages(session.id, 2).unwrap();
        assert_eq!(last_two.len(), 2);
        assert_eq!(last_two[0].content, "done");
    }
}
