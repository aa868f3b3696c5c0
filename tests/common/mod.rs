//! Shared fixtures for integration tests.
#![allow(dead_code)]

use std::io::Write;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use tempfile::TempDir;

use docqa::app::App;
use docqa::config::Config;
use docqa::sqlite_store::SqliteStore;
use docqa::{db, migrate};
use docqa_core::embedding::HashingEmbedder;
use docqa_core::generation::{ChatMessage, ChatModel};
use docqa_core::index::VectorStore;
use docqa_core::models::{IndexedVector, RetrievedChunk, StoredEntry};

// ─── Config ─────────────────────────────────────────────────────────

pub fn test_config(tmp: &TempDir) -> Config {
    let root = tmp.path();
    let config_content = format!(
        r#"
[index]
directory = "{}"
collection = "rag_docs"

[loader]
temp_dir = "{}"

[embedding]
provider = "hash"
dims = 256

[server]
bind = "127.0.0.1:0"
"#,
        root.join("vectordb").display(),
        scratch_dir(tmp).display()
    );
    toml::from_str(&config_content).unwrap()
}

/// Directory the loader writes scoped temp files into.
pub fn scratch_dir(tmp: &TempDir) -> std::path::PathBuf {
    let dir = tmp.path().join("scratch");
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

pub fn scratch_is_empty(tmp: &TempDir) -> bool {
    std::fs::read_dir(scratch_dir(tmp)).unwrap().count() == 0
}

// ─── Chat models ────────────────────────────────────────────────────

/// Chat model that returns a fixed reply and records every prompt.
pub struct ScriptedChat {
    reply: String,
    pub prompts: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedChat {
    pub fn new(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.to_string(),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl ChatModel for ScriptedChat {
    fn model_name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, messages: &[ChatMessage], _temperature: f32) -> Result<String> {
        self.prompts.lock().unwrap().push(messages.to_vec());
        Ok(format!("  {}\n", self.reply))
    }
}

/// Chat model whose backend is always down.
pub struct UnreachableChat;

#[async_trait]
impl ChatModel for UnreachableChat {
    fn model_name(&self) -> &str {
        "unreachable"
    }

    async fn complete(&self, _messages: &[ChatMessage], _temperature: f32) -> Result<String> {
        anyhow::bail!("connection refused")
    }
}

// ─── Stores ─────────────────────────────────────────────────────────

/// Store that rejects every write.
pub struct FailingStore;

#[async_trait]
impl VectorStore for FailingStore {
    async fn upsert(&self, _records: &[IndexedVector]) -> Result<()> {
        anyhow::bail!("database is locked")
    }
    async fn nearest(&self, _query: &[f32], _k: usize) -> Result<Vec<RetrievedChunk>> {
        Ok(Vec::new())
    }
    async fn list(&self, _limit: usize, _offset: usize) -> Result<Vec<StoredEntry>> {
        Ok(Vec::new())
    }
    async fn count(&self) -> Result<usize> {
        Ok(0)
    }
}

// ─── Apps ───────────────────────────────────────────────────────────

pub async fn sqlite_store(config: &Config) -> Arc<SqliteStore> {
    let pool = db::connect(config).await.unwrap();
    migrate::ensure_schema(&pool).await.unwrap();
    Arc::new(SqliteStore::new(pool, config.index.collection.clone()))
}

/// App over a SQLite index in `tmp`, hashing embedder, and `chat`.
pub async fn sqlite_app(tmp: &TempDir, chat: Arc<dyn ChatModel>) -> App {
    let config = test_config(tmp);
    let store = sqlite_store(&config).await;
    App::with_parts(&config, store, Arc::new(HashingEmbedder::default()), chat).unwrap()
}

pub fn app_with_store(tmp: &TempDir, store: Arc<dyn VectorStore>, chat: Arc<dyn ChatModel>) -> App {
    let config = test_config(tmp);
    App::with_parts(&config, store, Arc::new(HashingEmbedder::default()), chat).unwrap()
}

// ─── Document fixtures ──────────────────────────────────────────────

/// `count` space-separated words `{prefix}0000`, `{prefix}0001`, ...
pub fn words(prefix: &str, count: usize) -> String {
    (0..count)
        .map(|i| format!("{}{:04}", prefix, i))
        .collect::<Vec<_>>()
        .join(" ")
}

/// PDF with one page per entry; each page shows its lines top to bottom
/// in Helvetica. Builds body then xref with correct byte offsets so
/// pdf-extract can parse it. Text must not contain parentheses or
/// backslashes.
pub fn pdf_with_pages(pages: &[Vec<String>]) -> Vec<u8> {
    let n = pages.len();
    let font_id = 3;
    let page_id = |i: usize| 4 + 2 * i;
    let content_id = |i: usize| 5 + 2 * i;
    let object_count = 3 + 2 * n;

    let mut out = Vec::new();
    let mut offsets = vec![0usize; object_count + 1];
    out.extend_from_slice(b"%PDF-1.4\n");

    offsets[1] = out.len();
    out.extend_from_slice(b"1 0 obj << /Type /Catalog /Pages 2 0 R >> endobj\n");

    offsets[2] = out.len();
    let kids = (0..n)
        .map(|i| format!("{} 0 R", page_id(i)))
        .collect::<Vec<_>>()
        .join(" ");
    out.extend_from_slice(
        format!(
            "2 0 obj << /Type /Pages /Kids [{}] /Count {} >> endobj\n",
            kids, n
        )
        .as_bytes(),
    );

    offsets[font_id] = out.len();
    out.extend_from_slice(
        b"3 0 obj << /Type /Font /Subtype /Type1 /BaseFont /Helvetica >> endobj\n",
    );

    for (i, lines) in pages.iter().enumerate() {
        offsets[page_id(i)] = out.len();
        out.extend_from_slice(
            format!(
                "{} 0 obj << /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents {} 0 R /Resources << /Font << /F1 3 0 R >> >> >> endobj\n",
                page_id(i),
                content_id(i)
            )
            .as_bytes(),
        );

        let mut stream = String::from("BT /F1 10 Tf 40 750 Td\n");
        for line in lines {
            stream.push_str(&format!("({}) Tj 0 -14 Td\n", line));
        }
        stream.push_str("ET");

        offsets[content_id(i)] = out.len();
        out.extend_from_slice(
            format!(
                "{} 0 obj << /Length {} >> stream\n{}\nendstream endobj\n",
                content_id(i),
                stream.len(),
                stream
            )
            .as_bytes(),
        );
    }

    let xref_start = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n", object_count + 1).as_bytes());
    out.extend_from_slice(format!("{:010} 65535 f \n", 0).as_bytes());
    for offset in offsets.iter().skip(1) {
        out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
    }
    out.extend_from_slice(
        format!(
            "trailer << /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            object_count + 1,
            xref_start
        )
        .as_bytes(),
    );
    out
}

/// Minimal docx (ZIP) whose `word/document.xml` has one `w:p` per paragraph.
pub fn docx_with_paragraphs(paragraphs: &[&str]) -> Vec<u8> {
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<w:p><w:r><w:t>{}</w:t></w:r></w:p>", p))
        .collect();
    let xml = format!(
        "<?xml version=\"1.0\"?><w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\"><w:body>{}</w:body></w:document>",
        body
    );

    let mut buf = Vec::new();
    {
        let mut zip = zip::ZipWriter::new(std::io::Cursor::new(&mut buf));
        zip.start_file("word/document.xml", zip::write::SimpleFileOptions::default())
            .unwrap();
        zip.write_all(xml.as_bytes()).unwrap();
        zip.finish().unwrap();
    }
    buf
}
