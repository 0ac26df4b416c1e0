//! In-memory vector collection with approximate-nearest-neighbor support.
//!
//! Records are inserted whole under a write lock, so concurrent readers
//! never observe a partially written record. The HNSW index is rebuilt on
//! insert (writes are rare relative to reads); when it is unavailable the
//! collection falls back to a linear scan.

use std::cmp::Ordering;
use std::sync::RwLock;

use hora::core::ann_index::ANNIndex;
use hora::core::metrics::Metric;
use hora::index::hnsw_idx::HNSWIndex;
use hora::index::hnsw_params::HNSWParams;
use tracing::{debug, warn};

use crate::retrieval::records::VectorRecord;

pub struct VectorCollection {
    name: &'static str,
    dimension: usize,
    inner: RwLock<CollectionInner>,
}

struct CollectionInner {
    records: Vec<VectorRecord>,
    ann: Option<HNSWIndex<f32, i64>>,
}

impl VectorCollection {
    pub fn new(name: &'static str, dimension: usize) -> Self {
        Self {
            name,
            dimension,
            inner: RwLock::new(CollectionInner {
                records: Vec::new(),
                ann: None,
            }),
        }
    }

    /// Replace the collection contents with records loaded from storage and
    /// build the index once over the full set.
    pub fn hydrate(&self, records: Vec<VectorRecord>) {
        let mut inner = self.inner.write().unwrap();
        inner.records = records;
        inner.ann = Self::build_index(self.dimension, &inner.records);
        debug!(
            "Collection {} hydrated with {} record(s)",
            self.name,
            inner.records.len()
        );
    }

    /// Whole-record insert. The index accepts complete records only.
    pub fn insert(&self, record: VectorRecord) {
        let mut inner = self.inner.write().unwrap();
        inner.records.push(record);
        inner.ann = Self::build_index(self.dimension, &inner.records);
    }

    /// Top matches by cosine similarity (`1 − distance`), filtered. The ANN
    /// path over-fetches before filtering; when the index is unavailable or
    /// the filter would starve it, the linear path scores everything.
    pub fn search<F>(&self, query: &[f32], fetch: usize, filter: F) -> Vec<(VectorRecord, f32)>
    where
        F: Fn(&VectorRecord) -> bool,
    {
        if fetch == 0 {
            return Vec::new();
        }
        let inner = self.inner.read().unwrap();

        let candidates: Vec<usize> = match &inner.ann {
            Some(ann) if inner.records.len() > fetch * 4 => ann
                .search(query, (fetch * 4).max(32))
                .into_iter()
                .map(|key| key as usize)
                .collect(),
            _ => (0..inner.records.len()).collect(),
        };

        let mut scored: Vec<(VectorRecord, f32)> = candidates
            .into_iter()
            .filter_map(|i| inner.records.get(i))
            .filter(|record| filter(record))
            .map(|record| {
                let similarity = cosine_similarity(query, &record.embedding);
                (record.clone(), similarity)
            })
            .collect();

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        scored.truncate(fetch);
        scored
    }

    /// Revise the quality score of a stored record in place.
    pub fn update_quality(&self, record_id: &str, quality_score: f32) -> bool {
        let mut inner = self.inner.write().unwrap();
        match inner.records.iter_mut().find(|r| r.id == record_id) {
            Some(record) => {
                record.quality_score = quality_score.clamp(0.0, 1.0);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn build_index(dimension: usize, records: &[VectorRecord]) -> Option<HNSWIndex<f32, i64>> {
        if records.is_empty() {
            return None;
        }

        let params = HNSWParams {
            n_neighbor: 16,
            ef_build: 100,
            ef_search: 50,
            ..Default::default()
        };
        let mut index = HNSWIndex::<f32, i64>::new(dimension, &params);

        for (position, record) in records.iter().enumerate() {
            if record.embedding.len() != dimension {
                warn!(
                    "Record {} has dimension {} (expected {}), skipping from index",
                    record.id,
                    record.embedding.len(),
                    dimension
                );
                continue;
            }
            let _ = index.add(&record.embedding, position as i64);
        }

        match index.build(Metric::CosineSimilarity) {
            Ok(()) => Some(index),
            Err(e) => {
                warn!("Failed to build ANN index, using linear search: {}", e);
                None
            }
        }
    }
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}
