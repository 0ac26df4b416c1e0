//! Persisted sessions and messages with serialized tool-call metadata

use std::sync::Arc;

use chrono::Utc;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;

use crate::quote_db::schema::StoredMessage;

pub struct ConversationStore {
    pool: Arc<Pool<SqliteConnectionManager>>,
}

impl ConversationStore {
    pub fn new(pool: Arc<Pool<SqliteConnectionManager>>) -> Self {
        Self { pool }
    }

    fn get_conn(&self) -> anyhow::Result<r2d2::PooledConnection<SqliteConnectionManager>> {
        self.pool
            .get()
            .map_err(|e| anyhow::anyhow!("Failed to get connection from pool: {}", e))
    }

    /// Create the session row on first reference, refresh last_accessed on
    /// every later one.
    pub fn ensure_session(&self, session_id: &str) -> anyhow::Result<()> {
        let conn = self.get_conn()?;
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO sessions (id, created_at, last_accessed) VALUES (?1, ?2, ?2)
             ON CONFLICT(id) DO UPDATE SET last_accessed = ?2",
            params![session_id, now],
        )?;
        Ok(())
    }

    pub fn save_message(
        &self,
        session_id: &str,
        role: &str,
        content: &str,
        tool_calls: Option<&serde_json::Value>,
    ) -> anyhow::Result<i64> {
        self.ensure_session(session_id)?;
        let conn = self.get_conn()?;
        let serialized = tool_calls.map(|v| v.to_string());
        conn.execute(
            "INSERT INTO messages (session_id, role, content, tool_calls, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![session_id, role, content, serialized, Utc::now().to_rfc3339()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn get_session_messages(&self, session_id: &str) -> anyhow::Result<Vec<StoredMessage>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, session_id, role, content, tool_calls, timestamp
             FROM messages WHERE session_id = ?1 ORDER BY id",
        )?;

        let mut rows = stmt.query([session_id])?;
        let mut messages = Vec::new();
        while let Some(row) = rows.next()? {
            let tool_calls: Option<String> = row.get(4)?;
            let timestamp_str: String = row.get(5)?;
            let timestamp = chrono::DateTime::parse_from_rfc3339(&timestamp_str)
                .map_err(|e| anyhow::anyhow!("Failed to parse timestamp: {}", e))?
                .with_timezone(&Utc);

            messages.push(StoredMessage {
                id: row.get(0)?,
                session_id: row.get(1)?,
                role: row.get(2)?,
                content: row.get(3)?,
                tool_calls: tool_calls.and_then(|raw| serde_json::from_str(&raw).ok()),
                timestamp,
            });
        }

        Ok(messages)
    }

    pub fn session_message_count(&self, session_id: &str) -> anyhow::Result<i64> {
        let conn = self.get_conn()?;
        Ok(conn.query_row(
            "SELECT COUNT(*) FROM messages WHERE session_id = ?1",
            [session_id],
            |row| row.get(0),
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quote_db::QuoteDatabase;

    #[test]
    fn test_save_and_fetch_messages_in_order() {
        let db = QuoteDatabase::new_in_memory().unwrap();
        db.conversations
            .save_message("s1", "user", "hello", None)
            .unwrap();
        db.conversations
            .save_message(
                "s1",
                "assistant",
                "hi there",
                Some(&serde_json::json!({"tools_invoked": ["quote_navigator"]})),
            )
            .unwrap();

        let messages = db.conversations.get_session_messages("s1").unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "user");
        assert_eq!(messages[1].role, "assistant");
        assert!(messages[1].tool_calls.is_some());
        assert!(messages[0].tool_calls.is_none());
    }

    #[test]
    fn test_ensure_session_is_idempotent() {
        let db = QuoteDatabase::new_in_memory().unwrap();
        db.conversations.ensure_session("s1").unwrap();
        db.conversations.ensure_session("s1").unwrap();

        assert_eq!(db.get_stats().unwrap().total_sessions, 1);
    }

    #[test]
    fn test_message_count_is_per_session() {
        let db = QuoteDatabase::new_in_memory().unwrap();
        db.conversations.save_message("a", "user", "x", None).unwrap();
        db.conversations.save_message("a", "user", "y", None).unwrap();
        db.conversations.save_message("b", "user", "z", None).unwrap();

        assert_eq!(db.conversations.session_message_count("a").unwrap(), 2);
        assert_eq!(db.conversations.session_message_count("b").unwrap(), 1);
    }
}
