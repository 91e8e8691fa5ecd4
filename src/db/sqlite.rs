use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Result as SqliteResult;

pub type DbConn = PooledConnection<SqliteConnectionManager>;

/// SQLite database behind an r2d2 connection pool.
///
/// Table-specific operations live in `db::tables::*` as `impl Database`
/// blocks; this module only owns the pool and the schema.
pub struct Database {
    pool: Pool<SqliteConnectionManager>,
}

impl Database {
    /// Open (or create) the database at `path` and ensure the schema exists.
    /// `":memory:"` gives an in-memory database (used by tests); the pool is
    /// pinned to a single connection in that case so every caller sees the
    /// same data.
    pub fn new(path: &str) -> Result<Self, String> {
        let (manager, max_size) = if path == ":memory:" {
            (SqliteConnectionManager::memory(), 1)
        } else {
            if let Some(parent) = std::path::Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)
                        .map_err(|e| format!("Failed to create database directory: {}", e))?;
                }
            }
            (SqliteConnectionManager::file(path), 8)
        };

        let pool = Pool::builder()
            .max_size(max_size)
            .build(manager)
            .map_err(|e| format!("Failed to create connection pool: {}", e))?;

        let db = Database { pool };
        db.init_schema()
            .map_err(|e| format!("Failed to initialize schema: {}", e))?;
        Ok(db)
    }

    /// Get a pooled connection. Panics only if the pool is exhausted past
    /// its timeout, which indicates a leaked connection.
    pub fn conn(&self) -> DbConn {
        self.pool.get().expect("Failed to get database connection")
    }

    fn init_schema(&self) -> SqliteResult<()> {
        let conn = self.conn();

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                external_id TEXT NOT NULL UNIQUE,
                display_name TEXT,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS tasks (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id),
                name TEXT NOT NULL,
                description TEXT,
                priority TEXT NOT NULL DEFAULT 'medium',
                status TEXT NOT NULL DEFAULT 'pending',
                tags TEXT NOT NULL DEFAULT '[]',
                due_at TEXT,
                created_at TEXT NOT NULL,
                completed_at TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_tasks_user ON tasks(user_id);
            CREATE INDEX IF NOT EXISTS idx_tasks_user_status ON tasks(user_id, status);

            CREATE TABLE IF NOT EXISTS chat_sessions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL REFERENCES users(id),
                is_active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                last_activity_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_chat_sessions_user ON chat_sessions(user_id, is_active);

            CREATE TABLE IF NOT EXISTS chat_messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id INTEGER NOT NULL REFERENCES chat_sessions(id),
                role TEXT NOT NULL,
                content TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_chat_messages_session ON chat_messages(session_id);",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_database_initializes() {
        let db = Database::new(":memory:").expect("in-memory db");
        let conn = db.conn();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM tasks", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_file_database_initializes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("behflow.db");
        let db = Database::new(path.to_str().unwrap()).expect("file db");
        let conn = db.conn();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }
}
