//! Grounded answer synthesis.
//!
//! Embeds the question, retrieves the top-k chunks, and asks the chat
//! model to answer from that context only. Sources are the retrieved
//! chunks' `(filename, page, content_hash)` in retrieval order.

use std::sync::Arc;
use std::time::Duration;

use docqa_core::generation::ChatModel;
use docqa_core::index::VectorIndex;
use docqa_core::models::{AnswerResult, SourceCitation};
use docqa_core::prompt::{build_messages, format_context, NO_CONTEXT_ANSWER};
use docqa_core::{Error, Result};

use crate::config::{GenerationConfig, RetrievalConfig};

pub struct Synthesizer {
    index: Arc<VectorIndex>,
    chat: Arc<dyn ChatModel>,
    temperature: f32,
    timeout: Duration,
    default_k: usize,
}

impl Synthesizer {
    pub fn new(index: Arc<VectorIndex>, chat: Arc<dyn ChatModel>) -> Self {
        let generation = GenerationConfig::default();
        Self {
            index,
            chat,
            temperature: generation.temperature,
            timeout: Duration::from_secs(generation.timeout_secs),
            default_k: RetrievalConfig::default().top_k,
        }
    }

    pub fn with_config(
        mut self,
        generation: &GenerationConfig,
        retrieval: &RetrievalConfig,
    ) -> Self {
        self.temperature = generation.temperature;
        self.timeout = Duration::from_secs(generation.timeout_secs);
        self.default_k = retrieval.top_k;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Answer `question` from the top `k` chunks (default `retrieval.top_k`).
    ///
    /// The whole call, retrieval included, is bounded by the generation
    /// timeout. Dropping the returned future cancels in-flight requests.
    pub async fn answer(&self, question: &str, k: Option<usize>) -> Result<AnswerResult> {
        let question = question.trim();
        if question.is_empty() {
            return Err(Error::invalid_input("question must not be empty"));
        }
        let k = k.unwrap_or(self.default_k);

        tokio::time::timeout(self.timeout, self.answer_inner(question, k))
            .await
            .map_err(|_| Error::Timeout(self.timeout.as_secs()))?
    }

    async fn answer_inner(&self, question: &str, k: usize) -> Result<AnswerResult> {
        let chunks = self.index.query_text(question, k).await?;

        if chunks.is_empty() {
            tracing::info!(k, "no context retrieved; skipping generation");
            return Ok(AnswerResult {
                answer: NO_CONTEXT_ANSWER.to_string(),
                sources: Vec::new(),
            });
        }

        let messages = build_messages(question, &format_context(&chunks));
        let reply = self
            .chat
            .complete(&messages, self.temperature)
            .await
            .map_err(|e| Error::Generation(format!("{:#}", e)))?;

        tracing::info!(
            model = self.chat.model_name(),
            k,
            sources = chunks.len(),
            "answered question"
        );

        Ok(AnswerResult {
            answer: reply.trim().to_string(),
            sources: chunks.iter().map(SourceCitation::from).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use docqa_core::embedding::HashingEmbedder;
    use docqa_core::generation::ChatMessage;
    use docqa_core::index::memory::InMemoryStore;
    use std::sync::Mutex;

    struct Recorder {
        reply: String,
        seen: Mutex<Vec<Vec<ChatMessage>>>,
    }

    #[async_trait]
    impl ChatModel for Recorder {
        fn model_name(&self) -> &str {
            "recorder"
        }
        async fn complete(&self, messages: &[ChatMessage], _t: f32) -> anyhow::Result<String> {
            self.seen.lock().unwrap().push(messages.to_vec());
            Ok(self.reply.clone())
        }
    }

    struct Stalled;

    #[async_trait]
    impl ChatModel for Stalled {
        fn model_name(&self) -> &str {
            "stalled"
        }
        async fn complete(&self, _m: &[ChatMessage], _t: f32) -> anyhow::Result<String> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(String::new())
        }
    }

    fn empty_index() -> Arc<VectorIndex> {
        Arc::new(VectorIndex::new(
            Arc::new(InMemoryStore::new()),
            Arc::new(HashingEmbedder::default()),
        ))
    }

    #[tokio::test]
    async fn empty_question_is_rejected() {
        let chat = Arc::new(Recorder {
            reply: "x".into(),
            seen: Mutex::new(Vec::new()),
        });
        let synth = Synthesizer::new(empty_index(), chat);
        let err = synth.answer("   ", None).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn empty_index_answers_without_generation() {
        let chat = Arc::new(Recorder {
            reply: "should not be used".into(),
            seen: Mutex::new(Vec::new()),
        });
        let synth = Synthesizer::new(empty_index(), chat.clone());
        let result = synth.answer("What is the leave policy?", None).await.unwrap();
        assert_eq!(result.answer, NO_CONTEXT_ANSWER);
        assert!(result.sources.is_empty());
        assert!(chat.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn slow_generation_times_out() {
        let index = empty_index();
        let chunks = docqa_core::chunk::assign_identity(
            vec![docqa_core::models::TextChunk {
                text: "leave accrues monthly".into(),
                filename: "policy.txt".into(),
                page: None,
            }],
            &docqa_core::fingerprint::fingerprint(b"policy").unwrap(),
            &Default::default(),
        )
        .unwrap();
        index.upsert(&chunks).await;

        let synth =
            Synthesizer::new(index, Arc::new(Stalled)).with_timeout(Duration::from_millis(50));
        let err = synth.answer("leave", None).await.unwrap_err();
        assert!(matches!(err, Error::Timeout(_)));
    }
}
