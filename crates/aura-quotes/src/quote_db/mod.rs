//! SQLite-backed storage for quotes, sessions/messages, and vector records

pub mod conversation_store;
pub mod embedding_store;
pub mod quote_store;
pub mod schema;
pub mod seed;

pub use conversation_store::ConversationStore;
pub use embedding_store::EmbeddingStore;
pub use quote_store::QuoteStore;
pub use schema::*;

use std::path::Path;
use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use tracing::info;

pub struct QuoteDatabase {
    pub quotes: QuoteStore,
    pub conversations: ConversationStore,
    pub embeddings: EmbeddingStore,
    pool: Arc<Pool<SqliteConnectionManager>>,
}

impl QuoteDatabase {
    pub fn new(db_path: &Path) -> anyhow::Result<Self> {
        info!("Opening quote database at: {}", db_path.display());
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let manager = SqliteConnectionManager::file(db_path).with_flags(
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_FULL_MUTEX,
        );
        let pool = Pool::builder()
            .max_size(10)
            .build(manager)
            .map_err(|e| anyhow::anyhow!("Failed to create connection pool: {}", e))?;

        {
            let conn = pool.get()?;
            conn.execute_batch(
                "PRAGMA foreign_keys = ON;
                 PRAGMA journal_mode = WAL;
                 PRAGMA synchronous = NORMAL;
                 PRAGMA busy_timeout = 5000;",
            )?;
            conn.execute_batch(schema::SCHEMA_SQL)?;
        }
        let pool = Arc::new(pool);
        info!("Quote database initialized successfully");
        Ok(Self {
            quotes: QuoteStore::new(Arc::clone(&pool)),
            conversations: ConversationStore::new(Arc::clone(&pool)),
            embeddings: EmbeddingStore::new(Arc::clone(&pool)),
            pool,
        })
    }

    /// In-memory database for tests. Pool size 1: each SQLite `:memory:`
    /// connection is its own database.
    pub fn new_in_memory() -> anyhow::Result<Self> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder().max_size(1).build(manager)?;
        {
            let conn = pool.get()?;
            conn.execute_batch(schema::SCHEMA_SQL)?;
        }
        let pool = Arc::new(pool);
        Ok(Self {
            quotes: QuoteStore::new(Arc::clone(&pool)),
            conversations: ConversationStore::new(Arc::clone(&pool)),
            embeddings: EmbeddingStore::new(Arc::clone(&pool)),
            pool,
        })
    }

    pub fn get_stats(&self) -> anyhow::Result<DatabaseStats> {
        let conn = self.pool.get()?;
        let count = |table: &str| -> anyhow::Result<i64> {
            Ok(conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                row.get(0)
            })?)
        };
        Ok(DatabaseStats {
            total_sessions: count("sessions")?,
            total_messages: count("messages")?,
            total_quotes: count("quotes")?,
            total_vector_records: count("vector_records")?,
        })
    }
}

impl Drop for QuoteDatabase {
    fn drop(&mut self) {
        if let Ok(conn) = self.pool.get() {
            let _ = conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);");
        }
    }
}
