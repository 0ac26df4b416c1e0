//! Database schema definitions for the quote and conversation store

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredQuote {
    pub id: i64,
    pub category: String,
    pub quote: String,
    pub author: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredMessage {
    pub id: i64,
    pub session_id: String,
    pub role: String,
    pub content: String,
    pub tool_calls: Option<serde_json::Value>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct DatabaseStats {
    pub total_sessions: i64,
    pub total_messages: i64,
    pub total_quotes: i64,
    pub total_vector_records: i64,
}

pub const SCHEMA_SQL: &str = "
-- Sessions table
CREATE TABLE IF NOT EXISTS sessions (
    id TEXT PRIMARY KEY,
    created_at TIMESTAMP NOT NULL,
    last_accessed TIMESTAMP NOT NULL
);
-- Messages table (tool_calls holds serialized tool metadata)
CREATE TABLE IF NOT EXISTS messages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id TEXT NOT NULL,
    role TEXT NOT NULL,
    content TEXT NOT NULL,
    tool_calls TEXT,
    timestamp TIMESTAMP NOT NULL,
    FOREIGN KEY (session_id) REFERENCES sessions(id) ON DELETE CASCADE
);
-- Quotes table
CREATE TABLE IF NOT EXISTS quotes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    category TEXT NOT NULL,
    quote TEXT NOT NULL,
    author TEXT NOT NULL,
    created_at TIMESTAMP NOT NULL
);
-- Vector records: three logical collections keyed by record id
CREATE TABLE IF NOT EXISTS vector_records (
    id TEXT PRIMARY KEY,
    collection TEXT NOT NULL,
    document TEXT NOT NULL,
    category TEXT NOT NULL,
    quality_score REAL NOT NULL,
    is_correction BOOLEAN NOT NULL DEFAULT FALSE,
    payload TEXT NOT NULL,
    embedding BLOB NOT NULL,
    created_at TIMESTAMP NOT NULL
);
-- Indexes for performance
CREATE INDEX IF NOT EXISTS idx_messages_session ON messages (session_id);
CREATE INDEX IF NOT EXISTS idx_messages_timestamp ON messages (timestamp);
CREATE INDEX IF NOT EXISTS idx_quotes_category ON quotes (category);
CREATE INDEX IF NOT EXISTS idx_vector_records_collection ON vector_records (collection);
";
