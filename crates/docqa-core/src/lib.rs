//! # docqa core
//!
//! Backend-agnostic logic for docqa: content fingerprints, the recursive
//! text splitter, the vector index and its store abstraction, embedding and
//! chat model traits, and grounded prompt assembly.
//!
//! This crate contains no tokio, sqlx, filesystem I/O, or HTTP
//! dependencies. The `docqa` application crate supplies the SQLite store,
//! document loaders, and network-backed model providers.

pub mod chunk;
pub mod embedding;
pub mod error;
pub mod fingerprint;
pub mod generation;
pub mod index;
pub mod models;
pub mod prompt;

pub use error::{Error, Result};
