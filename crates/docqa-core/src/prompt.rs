//! Grounded prompt assembly.
//!
//! Retrieved chunks are rendered into a numbered context block:
//!
//! ```text
//! [1] handbook.pdf, page 3
//!  Employees accrue leave monthly...
//!
//! [2] policy.docx, page
//!  Leave requests are approved by...
//! ```
//!
//! and sent as the user turn of a two-message prompt whose system turn
//! restricts the model to that context.

use crate::generation::ChatMessage;
use crate::models::RetrievedChunk;

pub const SYSTEM_PROMPT: &str = "You are a careful assistant. Answer ONLY using the provided context.\n\
Your answers must always be based on the provided context. \
If the context does not contain enough information to answer, say that you don't know \
instead of guessing. Cite sources by their bracketed number, e.g. [1].";

/// Answer returned when retrieval finds nothing to ground on.
pub const NO_CONTEXT_ANSWER: &str =
    "I could not find any relevant context in the uploaded documents to answer this question.";

/// Render retrieved chunks as a numbered context block.
pub fn format_context(chunks: &[RetrievedChunk]) -> String {
    chunks
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let filename = if c.metadata.filename.is_empty() {
                "unknown"
            } else {
                c.metadata.filename.as_str()
            };
            let page = c.metadata.page.map(|p| p.to_string()).unwrap_or_default();
            format!("[{}] {}, page {}\n {}", i + 1, filename, page, c.text)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Build the system + user prompt for a question.
pub fn build_messages(question: &str, context: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::user(format!(
            "Question:\n{}\n\nContext:\n{}",
            question, context
        )),
    ]
}
