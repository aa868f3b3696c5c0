//! Ingestion pipeline: bytes → segments → chunks → vectors.
//!
//! ```text
//! upload bytes ──▶ fingerprint ──▶ loader ──▶ splitter ──▶ index.upsert
//!                  (sha-256)      (blocking)  (recursive)   (per-chunk outcome)
//! ```
//!
//! Structural problems (empty payload, unsupported extension, reserved
//! metadata keys) are rejected before any file or index I/O. A partial
//! upsert is reported, not raised.

use std::sync::Arc;

use docqa_core::chunk::{assign_identity, RecursiveSplitter};
use docqa_core::fingerprint::fingerprint;
use docqa_core::index::VectorIndex;
use docqa_core::models::{validate_extra, ExtraMetadata, IngestionReport};
use docqa_core::{Error, Result};

use crate::loader::{DocumentKind, DocumentLoader};

pub struct Ingestor {
    loader: DocumentLoader,
    splitter: RecursiveSplitter,
    index: Arc<VectorIndex>,
}

impl Ingestor {
    pub fn new(
        loader: DocumentLoader,
        splitter: RecursiveSplitter,
        index: Arc<VectorIndex>,
    ) -> Self {
        Self {
            loader,
            splitter,
            index,
        }
    }

    pub async fn ingest(
        &self,
        bytes: &[u8],
        filename: &str,
        extra: &ExtraMetadata,
    ) -> Result<IngestionReport> {
        if bytes.is_empty() {
            return Err(Error::invalid_input("uploaded file is empty"));
        }
        if filename.trim().is_empty() {
            return Err(Error::invalid_input("filename must not be empty"));
        }
        validate_extra(extra)?;
        DocumentKind::from_filename(filename)?;

        let content_hash = fingerprint(bytes)?;

        let loader = self.loader.clone();
        let owned_bytes = bytes.to_vec();
        let owned_name = filename.to_string();
        let segments = tokio::task::spawn_blocking(move || loader.load(&owned_bytes, &owned_name))
            .await
            .map_err(|e| Error::decode(filename, format!("decoder crashed: {}", e)))??;

        let chunks = assign_identity(self.splitter.split(&segments), &content_hash, extra)?;
        let upsert = self.index.upsert(&chunks).await;

        let report = IngestionReport {
            filename: filename.to_string(),
            content_hash: content_hash.to_string(),
            chunks_total: chunks.len(),
            chunks_added: upsert.added(),
            failures: upsert.failures(),
        };

        if report.failures.is_empty() {
            tracing::info!(
                filename,
                content_hash = %content_hash,
                segments = segments.len(),
                chunks = report.chunks_total,
                "ingested document"
            );
        } else {
            tracing::warn!(
                filename,
                content_hash = %content_hash,
                chunks = report.chunks_total,
                added = report.chunks_added,
                "ingested document with failures"
            );
        }

        Ok(report)
    }
}
