//! Recursive character text splitter.
//!
//! Splits segment text into chunks of at most `chunk_size` characters that
//! share up to `chunk_overlap` characters with their neighbour.
//!
//! # Algorithm
//!
//! 1. Pick the first separator from `["\n\n", "\n", " ", ""]` that occurs in
//!    the text (`""` means character boundaries).
//! 2. Split on it, keeping each separator at the start of the piece that
//!    follows it.
//! 3. Pieces shorter than `chunk_size` are merged greedily into windows of
//!    at most `chunk_size` characters. When a window is emitted, pieces are
//!    dropped from its front until what remains fits in `chunk_overlap`; the
//!    remainder opens the next window.
//! 4. Pieces that are too long are split again with the remaining
//!    separators.
//! 5. Windows are whitespace-trimmed; empty windows are dropped.
//!
//! Lengths are counted in `char`s, so multi-byte text is never cut inside a
//! code point. Output is a pure function of the input and the configuration.
//!
//! # Example
//!
//! ```rust
//! use docqa_core::chunk::RecursiveSplitter;
//!
//! let splitter = RecursiveSplitter::new(20, 5).unwrap();
//! let chunks = splitter.split_text("Hello world.\n\nSecond paragraph here.");
//! assert_eq!(chunks, vec!["Hello world.", "Second paragraph", "here."]);
//! ```

use std::collections::VecDeque;

use crate::error::{Error, Result};
use crate::fingerprint::ContentFingerprint;
use crate::models::{Chunk, ChunkMetadata, ExtraMetadata, Segment, TextChunk};

pub const DEFAULT_CHUNK_SIZE: usize = 1000;
pub const DEFAULT_CHUNK_OVERLAP: usize = 150;

/// Separators in priority order. The empty string splits between characters.
pub const SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecursiveSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Default for RecursiveSplitter {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

impl RecursiveSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::invalid_input("chunk_size must be > 0"));
        }
        if chunk_overlap >= chunk_size {
            return Err(Error::invalid_input(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                chunk_overlap, chunk_size
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Split every segment, keeping each chunk's source filename and page.
    pub fn split(&self, segments: &[Segment]) -> Vec<TextChunk> {
        segments
            .iter()
            .flat_map(|seg| {
                self.split_text(&seg.text)
                    .into_iter()
                    .map(move |text| TextChunk {
                        text,
                        filename: seg.filename.clone(),
                        page: seg.page,
                    })
            })
            .collect()
    }

    /// Split a single text into trimmed, non-empty chunks.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &SEPARATORS)
            .into_iter()
            .filter(|c| !c.trim().is_empty())
            .collect()
    }

    fn split_recursive(&self, text: &str, separators: &[&str]) -> Vec<String> {
        let (separator, remaining) = pick_separator(text, separators);
        let mut out = Vec::new();
        let mut good: Vec<String> = Vec::new();

        for piece in split_keeping_separator(text, separator) {
            if char_len(&piece) < self.chunk_size {
                good.push(piece);
                continue;
            }
            if !good.is_empty() {
                out.extend(self.merge_pieces(&good));
                good.clear();
            }
            if remaining.is_empty() {
                out.push(piece.trim().to_string());
            } else {
                out.extend(self.split_recursive(&piece, remaining));
            }
        }

        if !good.is_empty() {
            out.extend(self.merge_pieces(&good));
        }
        out
    }

    fn merge_pieces(&self, pieces: &[String]) -> Vec<String> {
        let mut docs = Vec::new();
        let mut window: VecDeque<(&str, usize)> = VecDeque::new();
        let mut total = 0usize;

        for piece in pieces {
            let len = char_len(piece);
            if total + len > self.chunk_size && !window.is_empty() {
                push_trimmed(&mut docs, &window);
                while total > self.chunk_overlap
                    || (total + len > self.chunk_size && total > 0)
                {
                    match window.pop_front() {
                        Some((_, front_len)) => total -= front_len,
                        None => break,
                    }
                }
            }
            window.push_back((piece.as_str(), len));
            total += len;
        }

        push_trimmed(&mut docs, &window);
        docs
    }
}

/// Attach identities to split chunks: every chunk gets the document
/// fingerprint and its 0-based position in the run.
pub fn assign_identity(
    chunks: Vec<TextChunk>,
    content_hash: &ContentFingerprint,
    extra: &ExtraMetadata,
) -> Result<Vec<Chunk>> {
    chunks
        .into_iter()
        .enumerate()
        .map(|(i, c)| {
            let metadata = ChunkMetadata::new(&c.filename, c.page, content_hash, i, extra)?;
            Ok(Chunk {
                text: c.text,
                metadata,
            })
        })
        .collect()
}

fn pick_separator<'a>(text: &str, separators: &'a [&'a str]) -> (&'a str, &'a [&'a str]) {
    for (i, sep) in separators.iter().enumerate() {
        if sep.is_empty() {
            return (*sep, &[]);
        }
        if text.contains(*sep) {
            return (*sep, &separators[i + 1..]);
        }
    }
    (separators.last().copied().unwrap_or(""), &[])
}

fn split_keeping_separator(text: &str, separator: &str) -> Vec<String> {
    if separator.is_empty() {
        return text.chars().map(String::from).collect();
    }
    let mut parts = text.split(separator);
    let mut out = Vec::new();
    if let Some(first) = parts.next() {
        if !first.is_empty() {
            out.push(first.to_string());
        }
    }
    for part in parts {
        out.push(format!("{}{}", separator, part));
    }
    out
}

fn push_trimmed(docs: &mut Vec<String>, window: &VecDeque<(&str, usize)>) {
    let joined: String = window.iter().map(|(s, _)| *s).collect();
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        docs.push(trimmed.to_string());
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}
