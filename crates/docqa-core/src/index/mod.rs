//! Vector index over document chunks.
//!
//! [`VectorIndex`] pairs an [`EmbeddingProvider`] with a [`VectorStore`]
//! backend. It embeds chunk text, persists vectors under the chunk key
//! `"{content_hash}:{chunk_index}"`, and answers nearest-neighbour queries.
//!
//! Storage is pluggable: [`memory::InMemoryStore`] here, and the SQLite
//! store in the app crate. Implementations must be `Send + Sync`.
//!
//! # Operations
//!
//! | Method | Purpose |
//! |--------|---------|
//! | [`upsert`](VectorIndex::upsert) | Embed and store chunks, reporting a per-chunk outcome |
//! | [`query`](VectorIndex::query) | Top-k chunks by cosine similarity |
//! | [`list_all`](VectorIndex::list_all) | Paginated listing of stored entries |

pub mod memory;

use std::cmp::Ordering;
use std::sync::Arc;

use anyhow::Result as AnyResult;
use async_trait::async_trait;

use crate::embedding::{embed_one, EmbeddingProvider};
use crate::error::{Error, Result};
use crate::models::{Chunk, ChunkFailure, IndexPage, IndexedVector, RetrievedChunk, StoredEntry};

/// Default number of chunks embedded and written per batch.
pub const DEFAULT_BATCH_SIZE: usize = 64;
/// Default page size for [`VectorIndex::list_all`].
pub const DEFAULT_LIST_LIMIT: usize = 1000;

/// Abstract storage backend for indexed vectors.
///
/// Writes are keyed by [`IndexedVector::id`]; writing an existing id
/// replaces the stored record.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert or replace a batch of records. All-or-nothing per call.
    async fn upsert(&self, records: &[IndexedVector]) -> AnyResult<()>;

    /// Return up to `k` records closest to `query`, best first.
    async fn nearest(&self, query: &[f32], k: usize) -> AnyResult<Vec<RetrievedChunk>>;

    /// Return stored entries in insertion order.
    async fn list(&self, limit: usize, offset: usize) -> AnyResult<Vec<StoredEntry>>;

    /// Number of stored records.
    async fn count(&self) -> AnyResult<usize>;
}

/// Outcome of persisting one chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpsertOutcome {
    Succeeded,
    Failed(String),
}

/// Per-chunk outcomes of an [`VectorIndex::upsert`] call, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpsertReport {
    pub outcomes: Vec<(usize, UpsertOutcome)>,
}

impl UpsertReport {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn added(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| *o == UpsertOutcome::Succeeded)
            .count()
    }

    pub fn failures(&self) -> Vec<ChunkFailure> {
        self.outcomes
            .iter()
            .filter_map(|(chunk_index, o)| match o {
                UpsertOutcome::Failed(reason) => Some(ChunkFailure {
                    chunk_index: *chunk_index,
                    reason: reason.clone(),
                }),
                UpsertOutcome::Succeeded => None,
            })
            .collect()
    }
}

pub struct VectorIndex {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    batch_size: usize,
}

impl VectorIndex {
    pub fn new(store: Arc<dyn VectorStore>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            store,
            embedder,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn embedder(&self) -> &dyn EmbeddingProvider {
        self.embedder.as_ref()
    }

    /// Embed and persist chunks.
    ///
    /// Never fails as a whole: a batch whose embedding or write fails is
    /// logged and its chunks are reported as [`UpsertOutcome::Failed`];
    /// later batches still run.
    pub async fn upsert(&self, chunks: &[Chunk]) -> UpsertReport {
        let mut report = UpsertReport::default();

        for batch in chunks.chunks(self.batch_size) {
            let outcome = match self.write_batch(batch).await {
                Ok(()) => UpsertOutcome::Succeeded,
                Err(e) => {
                    tracing::warn!(
                        chunks = batch.len(),
                        first_key = %batch[0].key(),
                        error = %e,
                        "index batch write failed"
                    );
                    UpsertOutcome::Failed(e.to_string())
                }
            };
            report.outcomes.extend(
                batch
                    .iter()
                    .map(|c| (c.metadata.chunk_index, outcome.clone())),
            );
        }

        report
    }

    async fn write_batch(&self, batch: &[Chunk]) -> Result<()> {
        let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
        let embeddings = self
            .embedder
            .embed(&texts)
            .await
            .map_err(|e| Error::IndexWrite(format!("embedding failed: {:#}", e)))?;
        if embeddings.len() != batch.len() {
            return Err(Error::IndexWrite(format!(
                "embedding provider returned {} vectors for {} texts",
                embeddings.len(),
                batch.len()
            )));
        }

        let records: Vec<IndexedVector> = batch
            .iter()
            .zip(embeddings)
            .map(|(c, embedding)| IndexedVector {
                id: c.key(),
                embedding,
                text: c.text.clone(),
                metadata: c.metadata.clone(),
            })
            .collect();

        self.store
            .upsert(&records)
            .await
            .map_err(|e| Error::IndexWrite(format!("{:#}", e)))
    }

    /// Top-`k` stored chunks by similarity to `embedding`, best first.
    pub async fn query(&self, embedding: &[f32], k: usize) -> Result<Vec<RetrievedChunk>> {
        if k == 0 {
            return Ok(Vec::new());
        }
        self.store
            .nearest(embedding, k)
            .await
            .map_err(|e| Error::Retrieval(format!("{:#}", e)))
    }

    /// Embed `text` with the index's provider and query with it.
    pub async fn query_text(&self, text: &str, k: usize) -> Result<Vec<RetrievedChunk>> {
        if k == 0 {
            return Ok(Vec::new());
        }
        let embedding = embed_one(self.embedder.as_ref(), text)
            .await
            .map_err(|e| Error::Retrieval(format!("embedding the question failed: {:#}", e)))?;
        self.query(&embedding, k).await
    }

    /// Paginated listing of stored entries.
    pub async fn list_all(&self, limit: usize, offset: usize) -> Result<IndexPage> {
        let total = self.count().await?;
        let entries = self
            .store
            .list(limit, offset)
            .await
            .map_err(|e| Error::Internal(format!("{:#}", e)))?;
        Ok(IndexPage {
            total,
            limit,
            offset,
            entries,
        })
    }

    pub async fn count(&self) -> Result<usize> {
        self.store
            .count()
            .await
            .map_err(|e| Error::Internal(format!("{:#}", e)))
    }
}

/// Sort candidates best-first, keep the top `k`, and assign 1-based ranks.
///
/// Ties on score are broken by id so the order is stable.
pub fn rank_top_k(mut candidates: Vec<RetrievedChunk>, k: usize) -> Vec<RetrievedChunk> {
    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });
    candidates.truncate(k);
    for (i, c) in candidates.iter_mut().enumerate() {
        c.rank = i + 1;
    }
    candidates
}
