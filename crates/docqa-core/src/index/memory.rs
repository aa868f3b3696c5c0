//! In-memory [`VectorStore`] implementation for tests and ephemeral use.
//!
//! Records live in a `Vec` behind `std::sync::RwLock`, in first-insertion
//! order, with a `HashMap` from id to position for overwrites. Search is
//! brute-force cosine similarity over all stored vectors.

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::embedding::cosine_similarity;
use crate::models::{IndexedVector, RetrievedChunk, StoredEntry};

use super::{rank_top_k, VectorStore};

#[derive(Default)]
struct Inner {
    records: Vec<IndexedVector>,
    positions: HashMap<String, usize>,
}

/// In-memory vector store.
#[derive(Default)]
pub struct InMemoryStore {
    inner: RwLock<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> anyhow::Error {
    anyhow!("in-memory store lock poisoned")
}

#[async_trait]
impl VectorStore for InMemoryStore {
    async fn upsert(&self, records: &[IndexedVector]) -> Result<()> {
        let mut inner = self.inner.write().map_err(poisoned)?;
        for record in records {
            match inner.positions.get(&record.id).copied() {
                Some(pos) => inner.records[pos] = record.clone(),
                None => {
                    let pos = inner.records.len();
                    inner.positions.insert(record.id.clone(), pos);
                    inner.records.push(record.clone());
                }
            }
        }
        Ok(())
    }

    async fn nearest(&self, query: &[f32], k: usize) -> Result<Vec<RetrievedChunk>> {
        let inner = self.inner.read().map_err(poisoned)?;
        let candidates = inner
            .records
            .iter()
            .map(|r| RetrievedChunk {
                id: r.id.clone(),
                rank: 0,
                score: cosine_similarity(query, &r.embedding),
                text: r.text.clone(),
                metadata: r.metadata.clone(),
            })
            .collect();
        Ok(rank_top_k(candidates, k))
    }

    async fn list(&self, limit: usize, offset: usize) -> Result<Vec<StoredEntry>> {
        let inner = self.inner.read().map_err(poisoned)?;
        Ok(inner
            .records
            .iter()
            .skip(offset)
            .take(limit)
            .map(|r| StoredEntry {
                id: r.id.clone(),
                metadata: r.metadata.clone(),
                text: r.text.clone(),
            })
            .collect())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.inner.read().map_err(poisoned)?.records.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChunkMetadata, ExtraMetadata};

    fn record(id: &str, embedding: Vec<f32>, text: &str) -> IndexedVector {
        IndexedVector {
            id: id.to_string(),
            embedding,
            text: text.to_string(),
            metadata: ChunkMetadata {
                filename: "a.txt".to_string(),
                page: None,
                content_hash: "h".to_string(),
                chunk_index: 0,
                extra: ExtraMetadata::new(),
            },
        }
    }

    #[tokio::test]
    async fn overwrite_keeps_position_and_count() {
        let store = InMemoryStore::new();
        store
            .upsert(&[
                record("h:0", vec![1.0, 0.0], "first"),
                record("h:1", vec![0.0, 1.0], "second"),
            ])
            .await
            .unwrap();
        store
            .upsert(&[record("h:0", vec![1.0, 0.0], "first, revised")])
            .await
            .unwrap();

        assert_eq!(store.count().await.unwrap(), 2);
        let listed = store.list(10, 0).await.unwrap();
        assert_eq!(listed[0].id, "h:0");
        assert_eq!(listed[0].text, "first, revised");
        assert_eq!(listed[1].id, "h:1");
    }

    #[tokio::test]
    async fn list_paginates() {
        let store = InMemoryStore::new();
        let records: Vec<_> = (0..5)
            .map(|i| record(&format!("h:{}", i), vec![1.0], "t"))
            .collect();
        store.upsert(&records).await.unwrap();

        let page = store.list(2, 3).await.unwrap();
        assert_eq!(page.iter().map(|e| e.id.as_str()).collect::<Vec<_>>(), vec!["h:3", "h:4"]);
        assert!(store.list(10, 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn nearest_returns_best_first() {
        let store = InMemoryStore::new();
        store
            .upsert(&[
                record("x", vec![0.0, 1.0], "orthogonal"),
                record("y", vec![1.0, 0.0], "aligned"),
                record("z", vec![0.7, 0.7], "diagonal"),
            ])
            .await
            .unwrap();

        let hits = store.nearest(&[1.0, 0.0], 2).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, "y");
        assert_eq!(hits[1].id, "z");
        assert_eq!(hits[0].rank, 1);
    }

    #[tokio::test]
    async fn empty_store_returns_nothing() {
        let store = InMemoryStore::new();
        assert!(store.nearest(&[1.0], 4).await.unwrap().is_empty());
        assert_eq!(store.count().await.unwrap(), 0);
    }
}
