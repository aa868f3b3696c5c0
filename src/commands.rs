//! CLI command implementations. Results print to stdout.

use std::path::Path;

use anyhow::{Context, Result};

use docqa_core::models::ExtraMetadata;

use crate::app::App;
use crate::config::Config;

pub async fn run_ingest(config: &Config, path: &Path, mut extra: ExtraMetadata) -> Result<()> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow::anyhow!("{} has no usable file name", path.display()))?;
    extra
        .entry("uploaded_at".to_string())
        .or_insert_with(|| chrono::Utc::now().to_rfc3339());

    let app = App::from_config(config).await?;
    let report = app.ingestor.ingest(&bytes, filename, &extra).await?;

    println!(
        "Ingested {} ({}): {}/{} chunks indexed",
        report.filename, report.content_hash, report.chunks_added, report.chunks_total
    );
    for failure in &report.failures {
        println!("  chunk {} failed: {}", failure.chunk_index, failure.reason);
    }
    Ok(())
}

pub async fn run_list(config: &Config, limit: usize, offset: usize) -> Result<()> {
    let app = App::from_config(config).await?;
    let page = app.index.list_all(limit, offset).await?;

    if page.entries.is_empty() {
        println!("{} chunks in index (none at offset {}).", page.total, offset);
        return Ok(());
    }
    println!(
        "{} chunks in index (showing {}-{}):",
        page.total,
        offset + 1,
        offset + page.entries.len()
    );
    for entry in &page.entries {
        let page_label = entry
            .metadata
            .page
            .map(|p| format!(", page {}", p))
            .unwrap_or_default();
        let preview: String = entry.text.chars().take(80).collect();
        println!(
            "  {}  {}{}  {}",
            entry.id,
            entry.metadata.filename,
            page_label,
            preview.replace('\n', " ")
        );
    }
    Ok(())
}

pub async fn run_ask(config: &Config, question: &str, k: Option<usize>) -> Result<()> {
    let app = App::from_config(config).await?;
    let result = app.synthesizer.answer(question, k).await?;

    println!("{}", result.answer);
    if !result.sources.is_empty() {
        println!();
        println!("Sources:");
        for (i, source) in result.sources.iter().enumerate() {
            let page = source.page.map(|p| format!(", page {}", p)).unwrap_or_default();
            println!("  [{}] {}{}", i + 1, source.filename, page);
        }
    }
    Ok(())
}
