//! Quote catalogue: category lookups with random-sample semantics

use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;

use crate::quote_db::schema::StoredQuote;

pub struct QuoteStore {
    pool: Arc<Pool<SqliteConnectionManager>>,
}

impl QuoteStore {
    pub fn new(pool: Arc<Pool<SqliteConnectionManager>>) -> Self {
        Self { pool }
    }

    fn get_conn(&self) -> anyhow::Result<r2d2::PooledConnection<SqliteConnectionManager>> {
        self.pool
            .get()
            .map_err(|e| anyhow::anyhow!("Failed to get connection from pool: {}", e))
    }

    /// Random sample of quotes in a category. No ordering guarantee beyond
    /// the sample being random.
    pub fn get_by_category(&self, category: &str, limit: usize) -> anyhow::Result<Vec<StoredQuote>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, category, quote, author FROM quotes
             WHERE category = ?1 ORDER BY RANDOM() LIMIT ?2",
        )?;

        let quotes = stmt
            .query_map(params![category, limit as i64], |row| {
                Ok(StoredQuote {
                    id: row.get(0)?,
                    category: row.get(1)?,
                    quote: row.get(2)?,
                    author: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(quotes)
    }

    pub fn get_all(&self, limit: usize) -> anyhow::Result<Vec<StoredQuote>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, category, quote, author FROM quotes ORDER BY RANDOM() LIMIT ?1",
        )?;

        let quotes = stmt
            .query_map(params![limit as i64], |row| {
                Ok(StoredQuote {
                    id: row.get(0)?,
                    category: row.get(1)?,
                    quote: row.get(2)?,
                    author: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(quotes)
    }

    pub fn insert(&self, category: &str, quote: &str, author: &str) -> anyhow::Result<StoredQuote> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO quotes (category, quote, author, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![category, quote, author, chrono::Utc::now().to_rfc3339()],
        )?;
        let id = conn.last_insert_rowid();

        Ok(StoredQuote {
            id,
            category: category.to_string(),
            quote: quote.to_string(),
            author: author.to_string(),
        })
    }

    pub fn count(&self) -> anyhow::Result<i64> {
        let conn = self.get_conn()?;
        Ok(conn.query_row("SELECT COUNT(*) FROM quotes", [], |row| row.get(0))?)
    }
}
