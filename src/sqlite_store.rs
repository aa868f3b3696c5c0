//! SQLite-backed [`VectorStore`] implementation.
//!
//! All records live in the `vectors` table, scoped by collection name.
//! Embeddings are stored as little-endian `f32` BLOBs and searched by
//! brute-force cosine similarity.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use docqa_core::embedding::{blob_to_vec, cosine_similarity, vec_to_blob};
use docqa_core::index::{rank_top_k, VectorStore};
use docqa_core::models::{ChunkMetadata, IndexedVector, RetrievedChunk, StoredEntry};

pub struct SqliteStore {
    pool: SqlitePool,
    collection: String,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool, collection: impl Into<String>) -> Self {
        Self {
            pool,
            collection: collection.into(),
        }
    }
}

fn decode_metadata(json: &str) -> Result<ChunkMetadata> {
    serde_json::from_str(json).with_context(|| "corrupt metadata_json in vectors table")
}

#[async_trait]
impl VectorStore for SqliteStore {
    async fn upsert(&self, records: &[IndexedVector]) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        let mut tx = self.pool.begin().await?;

        for record in records {
            let metadata_json = serde_json::to_string(&record.metadata)?;
            sqlx::query(
                r#"
                INSERT INTO vectors (collection, id, content_hash, chunk_index, filename, page,
                                     text, metadata_json, embedding, dims, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(collection, id) DO UPDATE SET
                    filename = excluded.filename,
                    page = excluded.page,
                    text = excluded.text,
                    metadata_json = excluded.metadata_json,
                    embedding = excluded.embedding,
                    dims = excluded.dims,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(&self.collection)
            .bind(&record.id)
            .bind(&record.metadata.content_hash)
            .bind(record.metadata.chunk_index as i64)
            .bind(&record.metadata.filename)
            .bind(record.metadata.page.map(i64::from))
            .bind(&record.text)
            .bind(&metadata_json)
            .bind(vec_to_blob(&record.embedding))
            .bind(record.embedding.len() as i64)
            .bind(now)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn nearest(&self, query: &[f32], k: usize) -> Result<Vec<RetrievedChunk>> {
        let rows = sqlx::query(
            "SELECT id, text, metadata_json, embedding FROM vectors WHERE collection = ?",
        )
        .bind(&self.collection)
        .fetch_all(&self.pool)
        .await?;

        let mut candidates = Vec::with_capacity(rows.len());
        for row in &rows {
            let blob: Vec<u8> = row.get("embedding");
            let metadata_json: String = row.get("metadata_json");
            candidates.push(RetrievedChunk {
                id: row.get("id"),
                rank: 0,
                score: cosine_similarity(query, &blob_to_vec(&blob)),
                text: row.get("text"),
                metadata: decode_metadata(&metadata_json)?,
            });
        }

        Ok(rank_top_k(candidates, k))
    }

    async fn list(&self, limit: usize, offset: usize) -> Result<Vec<StoredEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT id, text, metadata_json FROM vectors
            WHERE collection = ?
            ORDER BY rowid
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(&self.collection)
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .bind(i64::try_from(offset).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let metadata_json: String = row.get("metadata_json");
                Ok(StoredEntry {
                    id: row.get("id"),
                    metadata: decode_metadata(&metadata_json)?,
                    text: row.get("text"),
                })
            })
            .collect()
    }

    async fn count(&self) -> Result<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM vectors WHERE collection = ?")
            .bind(&self.collection)
            .fetch_one(&self.pool)
            .await?;
        Ok(count as usize)
    }
}
