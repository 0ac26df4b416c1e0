//! Persistence for vector records across the three logical collections

use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use tracing::warn;

use crate::mood::verdict::MoodCategory;
use crate::retrieval::records::{CollectionKind, RecordPayload, VectorRecord};

pub struct EmbeddingStore {
    pool: Arc<Pool<SqliteConnectionManager>>,
}

impl EmbeddingStore {
    pub fn new(pool: Arc<Pool<SqliteConnectionManager>>) -> Self {
        Self { pool }
    }

    fn get_conn(&self) -> anyhow::Result<r2d2::PooledConnection<SqliteConnectionManager>> {
        self.pool
            .get()
            .map_err(|e| anyhow::anyhow!("Failed to get connection from pool: {}", e))
    }

    pub fn store_record(&self, record: &VectorRecord) -> anyhow::Result<()> {
        let embedding_bytes = bincode::serialize(&record.embedding)?;
        let payload = serde_json::to_string(&record.payload)?;
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO vector_records
             (id, collection, document, category, quality_score, is_correction,
              payload, embedding, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                record.id,
                record.collection.as_str(),
                record.document,
                record.category.as_str(),
                record.quality_score,
                record.is_correction,
                payload,
                embedding_bytes,
                record.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn load_collection(&self, kind: CollectionKind) -> anyhow::Result<Vec<VectorRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, collection, document, category, quality_score, is_correction,
                    payload, embedding, created_at
             FROM vector_records WHERE collection = ?1",
        )?;

        let mut rows = stmt.query([kind.as_str()])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            let payload_raw: String = row.get(6)?;
            let payload: RecordPayload = match serde_json::from_str(&payload_raw) {
                Ok(payload) => payload,
                Err(e) => {
                    warn!("Skipping vector record with unreadable payload: {}", e);
                    continue;
                }
            };
            let embedding_bytes: Vec<u8> = row.get(7)?;
            let embedding: Vec<f32> = bincode::deserialize(&embedding_bytes)
                .map_err(|e| anyhow::anyhow!("Deserialization error: {}", e))?;
            let category_raw: String = row.get(3)?;
            let created_at_str: String = row.get(8)?;
            let created_at = chrono::DateTime::parse_from_rfc3339(&created_at_str)
                .map_err(|e| anyhow::anyhow!("Failed to parse timestamp: {}", e))?
                .with_timezone(&chrono::Utc);

            records.push(VectorRecord {
                id: row.get(0)?,
                collection: kind,
                document: row.get(2)?,
                category: MoodCategory::parse_lossy(&category_raw),
                quality_score: row.get(4)?,
                is_correction: row.get(5)?,
                payload,
                embedding,
                created_at,
            });
        }

        Ok(records)
    }

    /// Revise the quality score of an existing record. Embedding and text
    /// are immutable.
    pub fn update_quality(&self, record_id: &str, quality_score: f32) -> anyhow::Result<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "UPDATE vector_records SET quality_score = ?1 WHERE id = ?2",
            params![quality_score.clamp(0.0, 1.0), record_id],
        )?;
        Ok(())
    }

    pub fn count(&self, kind: CollectionKind) -> anyhow::Result<i64> {
        let conn = self.get_conn()?;
        Ok(conn.query_row(
            "SELECT COUNT(*) FROM vector_records WHERE collection = ?1",
            [kind.as_str()],
            |row| row.get(0),
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quote_db::QuoteDatabase;

    #[test]
    fn test_store_and_load_round_trip() {
        let db = QuoteDatabase::new_in_memory().unwrap();
        let mut record =
            VectorRecord::quote("Dream bigger.", "Unknown", MoodCategory::Motivational);
        record.embedding = vec![0.1, 0.2, 0.3];
        db.embeddings.store_record(&record).unwrap();

        let loaded = db.embeddings.load_collection(CollectionKind::Quotes).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, record.id);
        assert_eq!(loaded[0].embedding, vec![0.1, 0.2, 0.3]);
        assert_eq!(loaded[0].category, MoodCategory::Motivational);
    }

    #[test]
    fn test_collections_are_isolated() {
        let db = QuoteDatabase::new_in_memory().unwrap();
        let mut quote = VectorRecord::quote("a", "b", MoodCategory::Funny);
        quote.embedding = vec![0.0];
        let mut interaction =
            VectorRecord::interaction("p", "r", MoodCategory::Funny, 0.8, None, 0.8);
        interaction.embedding = vec![0.0];

        db.embeddings.store_record(&quote).unwrap();
        db.embeddings.store_record(&interaction).unwrap();

        assert_eq!(db.embeddings.count(CollectionKind::Quotes).unwrap(), 1);
        assert_eq!(db.embeddings.count(CollectionKind::Conversations).unwrap(), 1);
        assert_eq!(db.embeddings.count(CollectionKind::Corrections).unwrap(), 0);
    }

    #[test]
    fn test_update_quality_clamps() {
        let db = QuoteDatabase::new_in_memory().unwrap();
        let mut record = VectorRecord::interaction("p", "r", MoodCategory::General, 0.5, None, 0.5);
        record.embedding = vec![0.0];
        db.embeddings.store_record(&record).unwrap();

        db.embeddings.update_quality(&record.id, 7.0).unwrap();
        let loaded = db
            .embeddings
            .load_collection(CollectionKind::Conversations)
            .unwrap();
        assert_eq!(loaded[0].quality_score, 1.0);
    }
}
