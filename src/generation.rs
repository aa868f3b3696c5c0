//! Chat model clients.
//!
//! - **[`OllamaChat`]**: `POST /api/chat` with `stream: false`.
//! - **[`OpenAIChat`]**: `POST /v1/chat/completions`.
//!
//! Generation is not retried; a failed call surfaces to the caller.

use std::sync::Arc;

use anyhow::{bail, Result};
use async_trait::async_trait;

use docqa_core::generation::{ChatMessage, ChatModel};

use crate::config::GenerationConfig;
use crate::http::{build_client, post_json};

const OLLAMA_DEFAULT_URL: &str = "http://localhost:11434";
const OPENAI_DEFAULT_URL: &str = "https://api.openai.com";

pub struct OllamaChat {
    model: String,
    url: String,
    client: reqwest::Client,
}

impl OllamaChat {
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        let url = config.url.as_deref().unwrap_or(OLLAMA_DEFAULT_URL);
        Ok(Self {
            model: config.model.clone(),
            url: url.trim_end_matches('/').to_string(),
            client: build_client(config.timeout_secs)?,
        })
    }
}

#[async_trait]
impl ChatModel for OllamaChat {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, messages: &[ChatMessage], temperature: f32) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "stream": false,
            "options": { "temperature": temperature },
        });
        let json = post_json(
            &self.client,
            &format!("{}/api/chat", self.url),
            None,
            &body,
            0,
            "Ollama",
        )
        .await?;
        parse_ollama_chat(&json)
    }
}

fn parse_ollama_chat(json: &serde_json::Value) -> Result<String> {
    json.get("message")
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("Invalid Ollama response: missing message.content"))
}

/// Requires the `OPENAI_API_KEY` environment variable.
pub struct OpenAIChat {
    model: String,
    url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAIChat {
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow::anyhow!("OPENAI_API_KEY environment variable not set"))?;
        let url = config.url.as_deref().unwrap_or(OPENAI_DEFAULT_URL);
        Ok(Self {
            model: config.model.clone(),
            url: url.trim_end_matches('/').to_string(),
            api_key,
            client: build_client(config.timeout_secs)?,
        })
    }
}

#[async_trait]
impl ChatModel for OpenAIChat {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, messages: &[ChatMessage], temperature: f32) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "temperature": temperature,
        });
        let json = post_json(
            &self.client,
            &format!("{}/v1/chat/completions", self.url),
            Some(&self.api_key),
            &body,
            0,
            "OpenAI",
        )
        .await?;
        parse_openai_chat(&json)
    }
}

fn parse_openai_chat(json: &serde_json::Value) -> Result<String> {
    json.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .map(str::to_string)
        .ok_or_else(|| {
            anyhow::anyhow!("Invalid OpenAI response: missing choices[0].message.content")
        })
}

pub fn create_chat_model(config: &GenerationConfig) -> Result<Arc<dyn ChatModel>> {
    match config.provider.as_str() {
        "ollama" => Ok(Arc::new(OllamaChat::new(config)?)),
        "openai" => Ok(Arc::new(OpenAIChat::new(config)?)),
        other => bail!("Unknown generation provider: {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ollama_chat_reply() {
        let json = serde_json::json!({
            "model": "gpt-oss:20b",
            "message": { "role": "assistant", "content": "Leave accrues monthly [1]." },
            "done": true
        });
        assert_eq!(parse_ollama_chat(&json).unwrap(), "Leave accrues monthly [1].");
    }

    #[test]
    fn parses_openai_chat_reply() {
        let json = serde_json::json!({
            "choices": [{ "index": 0, "message": { "role": "assistant", "content": "Yes." } }]
        });
        assert_eq!(parse_openai_chat(&json).unwrap(), "Yes.");
    }

    #[test]
    fn malformed_replies_are_errors() {
        assert!(parse_ollama_chat(&serde_json::json!({ "done": true })).is_err());
        assert!(parse_openai_chat(&serde_json::json!({ "choices": [] })).is_err());
    }

    #[test]
    fn default_config_builds_ollama_client() {
        let model = create_chat_model(&GenerationConfig::default()).unwrap();
        assert_eq!(model.model_name(), "gpt-oss:20b");
    }
}
