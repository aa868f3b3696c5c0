//! Wiring: one index, one ingestor, one synthesizer per process.

use std::sync::Arc;

use anyhow::Result;

use docqa_core::chunk::RecursiveSplitter;
use docqa_core::embedding::EmbeddingProvider;
use docqa_core::generation::ChatModel;
use docqa_core::index::{VectorIndex, VectorStore};

use crate::answer::Synthesizer;
use crate::config::Config;
use crate::embedding::create_provider;
use crate::generation::create_chat_model;
use crate::ingest::Ingestor;
use crate::loader::DocumentLoader;
use crate::sqlite_store::SqliteStore;
use crate::{db, migrate};

/// Shared application services, cheap to clone.
#[derive(Clone)]
pub struct App {
    pub index: Arc<VectorIndex>,
    pub ingestor: Arc<Ingestor>,
    pub synthesizer: Arc<Synthesizer>,
}

impl App {
    /// Open the SQLite index and build the configured providers.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let pool = db::connect(config).await?;
        migrate::ensure_schema(&pool).await?;
        let store = Arc::new(SqliteStore::new(pool, config.index.collection.clone()));

        let embedder = create_provider(&config.embedding)?;
        let chat = create_chat_model(&config.generation)?;

        tracing::info!(
            index = %config.index.db_path().display(),
            collection = %config.index.collection,
            embedding = embedder.model_name(),
            generation = chat.model_name(),
            "services ready"
        );

        Self::with_parts(config, store, embedder, chat)
    }

    /// Assemble from explicit backends.
    pub fn with_parts(
        config: &Config,
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        chat: Arc<dyn ChatModel>,
    ) -> Result<Self> {
        let index = Arc::new(
            VectorIndex::new(store, embedder).with_batch_size(config.embedding.batch_size),
        );
        let splitter =
            RecursiveSplitter::new(config.chunking.chunk_size, config.chunking.chunk_overlap)?;
        let ingestor = Ingestor::new(
            DocumentLoader::new(config.loader.temp_dir.clone()),
            splitter,
            Arc::clone(&index),
        );
        let synthesizer = Synthesizer::new(Arc::clone(&index), chat)
            .with_config(&config.generation, &config.retrieval);

        Ok(Self {
            index,
            ingestor: Arc::new(ingestor),
            synthesizer: Arc::new(synthesizer),
        })
    }
}
