//! Vector retrieval engine: embeddings, similarity search, and ranking
//! over the quote, conversation, and correction collections.

pub mod index;
pub mod ranking;
pub mod records;

pub use index::{cosine_similarity, VectorCollection};
pub use records::{CollectionKind, ErrorKind, RecordPayload, VectorRecord};

use std::sync::Arc;

use moka::sync::Cache;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::llm_worker::OllamaWorker;
use crate::mood::verdict::MoodCategory;
use crate::quote_db::QuoteDatabase;
use crate::utils::TextUtils;

/// Corrections are rare and always worth surfacing in full.
const CORRECTION_RESULT_LIMIT: usize = 3;
/// Minimum stored quality for a past conversation to be considered.
const CONVERSATION_QUALITY_FLOOR: f32 = 0.5;

pub struct RetrievalEngine {
    worker: Arc<OllamaWorker>,
    database: Arc<QuoteDatabase>,
    dimension: usize,
    quotes: VectorCollection,
    conversations: VectorCollection,
    corrections: VectorCollection,
    init: OnceCell<()>,
    embed_cache: Cache<String, Vec<f32>>,
}

impl RetrievalEngine {
    pub fn new(worker: Arc<OllamaWorker>, database: Arc<QuoteDatabase>, dimension: usize) -> Self {
        Self {
            worker,
            database,
            dimension,
            quotes: VectorCollection::new("quote_embeddings", dimension),
            conversations: VectorCollection::new("conversation_embeddings", dimension),
            corrections: VectorCollection::new("correction_embeddings", dimension),
            init: OnceCell::new(),
            embed_cache: Cache::new(2048),
        }
    }

    /// Hydrate the collections from persisted records. Runs at most once per
    /// process; concurrent first use waits on the same initialization.
    pub async fn ensure_initialized(&self) {
        self.init
            .get_or_init(|| async {
                for (kind, collection) in [
                    (CollectionKind::Quotes, &self.quotes),
                    (CollectionKind::Conversations, &self.conversations),
                    (CollectionKind::Corrections, &self.corrections),
                ] {
                    match self.database.embeddings.load_collection(kind) {
                        Ok(records) => collection.hydrate(records),
                        Err(e) => {
                            warn!("Failed to hydrate {}: {}", kind.as_str(), e);
                        }
                    }
                }
                info!(
                    "Retrieval engine ready: {} quote(s), {} conversation(s), {} correction(s)",
                    self.quotes.len(),
                    self.conversations.len(),
                    self.corrections.len()
                );
            })
            .await;
    }

    /// Embed a text, with a cache in front of the model call. Rejects
    /// vectors that do not match the configured index dimension.
    pub async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        if let Some(cached) = self.embed_cache.get(text) {
            return Ok(cached);
        }

        let embedding = self.worker.generate_embedding(text).await?;
        if embedding.len() != self.dimension {
            return Err(anyhow::anyhow!(
                "Embedding dimension mismatch: got {}, expected {}",
                embedding.len(),
                self.dimension
            ));
        }

        self.embed_cache.insert(text.to_string(), embedding.clone());
        Ok(embedding)
    }

    /// Semantic quote search. Filters by category unless it is `general`;
    /// ranks by similarity alone. Failures degrade to an empty result set.
    pub async fn search_quotes(
        &self,
        query: &str,
        category: MoodCategory,
        limit: usize,
    ) -> Vec<(VectorRecord, f32)> {
        self.ensure_initialized().await;
        let query_embedding = match self.embed(query).await {
            Ok(embedding) => embedding,
            Err(e) => {
                warn!(
                    "Quote search degraded to empty for '{}': {}",
                    TextUtils::truncate_with_ellipsis(query, 40),
                    e
                );
                return Vec::new();
            }
        };

        self.quotes.search(&query_embedding, limit, |record| {
            !category.is_specific() || record.category == category
        })
    }

    /// Similar past conversations: quality floor, corrections excluded,
    /// twice the requested candidates fetched, then re-ranked by the
    /// composite similarity/quality score and truncated.
    pub async fn search_conversations(
        &self,
        query: &str,
        limit: usize,
    ) -> Vec<(VectorRecord, f32)> {
        self.ensure_initialized().await;
        let query_embedding = match self.embed(query).await {
            Ok(embedding) => embedding,
            Err(e) => {
                warn!("Conversation search degraded to empty: {}", e);
                return Vec::new();
            }
        };

        let candidates = self.conversations.search(&query_embedding, limit * 2, |record| {
            record.quality_score >= CONVERSATION_QUALITY_FLOOR && !record.is_correction
        });

        let mut reranked = ranking::rerank_by_composite(candidates);
        reranked.truncate(limit);
        reranked
    }

    /// Similar past corrections, by similarity alone. Always returns up to
    /// the fixed correction limit regardless of what callers ask elsewhere.
    pub async fn search_corrections(&self, query: &str) -> Vec<(VectorRecord, f32)> {
        self.ensure_initialized().await;
        let query_embedding = match self.embed(query).await {
            Ok(embedding) => embedding,
            Err(e) => {
                warn!("Correction search degraded to empty: {}", e);
                return Vec::new();
            }
        };

        self.corrections
            .search(&query_embedding, CORRECTION_RESULT_LIMIT, |record| {
                record.is_correction
            })
    }

    /// Embed and store a record in its collection and in the database. The
    /// in-memory insert is whole-record; a persistence failure leaves the
    /// in-memory copy serving until restart.
    pub async fn ingest(&self, mut record: VectorRecord) -> anyhow::Result<()> {
        self.ensure_initialized().await;
        record.embedding = self.embed(&record.document).await?;

        if let Err(e) = self.database.embeddings.store_record(&record) {
            warn!("Failed to persist vector record {}: {}", record.id, e);
        }

        let collection = self.collection_for(record.collection);
        debug!("Ingesting {} into {}", record.id, record.collection.as_str());
        collection.insert(record);
        Ok(())
    }

    /// Revise a conversation record's quality score (memory + storage).
    pub fn revise_quality(&self, record_id: &str, quality_score: f32) {
        if !self.conversations.update_quality(record_id, quality_score) {
            debug!("No in-memory record {} to revise", record_id);
        }
        if let Err(e) = self
            .database
            .embeddings
            .update_quality(record_id, quality_score)
        {
            warn!("Failed to persist quality revision for {}: {}", record_id, e);
        }
    }

    fn collection_for(&self, kind: CollectionKind) -> &VectorCollection {
        match kind {
            CollectionKind::Quotes => &self.quotes,
            CollectionKind::Conversations => &self.conversations,
            CollectionKind::Corrections => &self.corrections,
        }
    }

    /// Test-only direct insert that bypasses the embedding model.
    #[cfg(test)]
    pub(crate) fn insert_raw(&self, record: VectorRecord) {
        self.collection_for(record.collection).insert(record);
    }
}
