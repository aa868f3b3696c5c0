//! Core data models used throughout docqa.
//!
//! These types represent the segments, chunks, stored vectors, and answers
//! that flow through the ingestion and query pipelines.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::fingerprint::ContentFingerprint;

/// Metadata keys owned by the pipeline. Caller-supplied extras may not use them.
pub const RESERVED_METADATA_KEYS: [&str; 4] = ["filename", "page", "content_hash", "chunk_index"];

/// Caller-supplied metadata attached to every chunk of one ingestion.
pub type ExtraMetadata = BTreeMap<String, String>;

/// A unit of extracted text produced by the document loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub filename: String,
    /// 0-based page index for paginated formats.
    pub page: Option<u32>,
}

impl Segment {
    pub fn new(text: impl Into<String>, filename: impl Into<String>, page: Option<u32>) -> Self {
        Self {
            text: text.into(),
            filename: filename.into(),
            page,
        }
    }
}

/// A piece of segment text as produced by the splitter, before it is
/// assigned an identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    pub text: String,
    pub filename: String,
    pub page: Option<u32>,
}

/// Fixed metadata schema stored alongside every indexed vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub filename: String,
    pub page: Option<u32>,
    pub content_hash: String,
    pub chunk_index: usize,
    #[serde(flatten)]
    pub extra: ExtraMetadata,
}

impl ChunkMetadata {
    pub fn new(
        filename: &str,
        page: Option<u32>,
        content_hash: &ContentFingerprint,
        chunk_index: usize,
        extra: &ExtraMetadata,
    ) -> Result<Self> {
        if filename.trim().is_empty() {
            return Err(Error::invalid_input("filename must not be empty"));
        }
        validate_extra(extra)?;
        Ok(Self {
            filename: filename.to_string(),
            page,
            content_hash: content_hash.to_string(),
            chunk_index,
            extra: extra.clone(),
        })
    }
}

/// Reject extras that would shadow pipeline-owned keys.
pub fn validate_extra(extra: &ExtraMetadata) -> Result<()> {
    for key in extra.keys() {
        if key.trim().is_empty() {
            return Err(Error::invalid_input("metadata keys must not be empty"));
        }
        if RESERVED_METADATA_KEYS.contains(&key.as_str()) {
            return Err(Error::invalid_input(format!(
                "metadata key '{}' is reserved",
                key
            )));
        }
    }
    Ok(())
}

/// A chunk with its stable identity assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub text: String,
    pub metadata: ChunkMetadata,
}

impl Chunk {
    /// Stable key `"{content_hash}:{chunk_index}"` used for idempotent upsert.
    pub fn key(&self) -> String {
        chunk_key(&self.metadata.content_hash, self.metadata.chunk_index)
    }
}

pub fn chunk_key(content_hash: &str, chunk_index: usize) -> String {
    format!("{}:{}", content_hash, chunk_index)
}

/// Embedding + text + metadata persisted under a chunk key.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedVector {
    pub id: String,
    pub embedding: Vec<f32>,
    pub text: String,
    pub metadata: ChunkMetadata,
}

/// A stored vector returned by a similarity query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievedChunk {
    pub id: String,
    /// 1-based relevance rank.
    pub rank: usize,
    /// Cosine similarity to the query embedding.
    pub score: f32,
    pub text: String,
    pub metadata: ChunkMetadata,
}

/// A citation attached to an answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCitation {
    pub filename: String,
    pub page: Option<u32>,
    pub content_hash: Option<String>,
}

impl From<&RetrievedChunk> for SourceCitation {
    fn from(chunk: &RetrievedChunk) -> Self {
        let m = &chunk.metadata;
        Self {
            filename: if m.filename.is_empty() {
                "unknown".to_string()
            } else {
                m.filename.clone()
            },
            page: m.page,
            content_hash: (!m.content_hash.is_empty()).then(|| m.content_hash.clone()),
        }
    }
}

/// Generated answer plus the sources it was grounded on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerResult {
    pub answer: String,
    pub sources: Vec<SourceCitation>,
}

/// A chunk that could not be persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChunkFailure {
    pub chunk_index: usize,
    pub reason: String,
}

/// Result of one ingestion call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestionReport {
    pub filename: String,
    pub content_hash: String,
    pub chunks_total: usize,
    pub chunks_added: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<ChunkFailure>,
}

/// One stored entry in an administrative listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredEntry {
    pub id: String,
    pub metadata: ChunkMetadata,
    pub text: String,
}

/// A page of stored entries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexPage {
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
    pub entries: Vec<StoredEntry>,
}
