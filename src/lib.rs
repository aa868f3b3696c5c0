//! # docqa
//!
//! Document question answering over your own files. Upload PDF, DOCX, TXT
//! or Markdown documents; they are split into overlapping chunks, embedded,
//! and stored in a local SQLite vector index. Questions are answered by a
//! chat model that sees only the retrieved chunks, and every answer lists
//! the filename and page of its sources.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌───────────────┐   ┌─────────────┐
//! │  Loader  │──▶│ Chunk + Embed │──▶│   SQLite    │
//! │ PDF/DOCX │   │  (recursive)  │   │   vectors   │
//! └──────────┘   └───────────────┘   └──────┬──────┘
//!                                           │ top-k
//!                                    ┌──────▼──────┐
//!                                    │ Synthesizer │──▶ answer + sources
//!                                    └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! docqa init
//! docqa ingest handbook.pdf
//! docqa ask "How many vacation days do new hires get?"
//! docqa serve
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`loader`] | PDF, DOCX, and text decoding |
//! | [`ingest`] | Ingestion pipeline |
//! | [`answer`] | Grounded answer synthesis |
//! | [`embedding`] | Embedding provider clients |
//! | [`generation`] | Chat model clients |
//! | [`sqlite_store`] | SQLite vector store |
//! | [`server`] | HTTP server |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema setup |

pub mod answer;
pub mod app;
pub mod commands;
pub mod config;
pub mod db;
pub mod embedding;
pub mod generation;
pub mod http;
pub mod ingest;
pub mod loader;
pub mod logging;
pub mod migrate;
pub mod server;
pub mod sqlite_store;

pub use docqa_core;
