//! LLM provider boundary.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ChatError;
use crate::message::ChatMessage;

/// One outbound completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub system: String,
    /// Already filtered to user/assistant turns, starting with a user turn.
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
}

/// A block of a provider answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentSegment {
    Text(String),
    /// Tool calls, images and other non-text blocks, by kind.
    Other(String),
}

#[async_trait]
pub trait ChatProvider: Send + Sync {
    async fn complete(&self, request: ChatRequest) -> Result<Vec<ContentSegment>, ChatError>;
}

pub const ANTHROPIC_API_URL: &str = "https://api.anthropic.com";
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    pub api_key: String,
    pub model: String,
    /// Overridable for tests and proxies.
    pub base_url: String,
    pub timeout: Duration,
}

impl AnthropicConfig {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: ANTHROPIC_API_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Messages API client.
#[derive(Debug, Clone)]
pub struct AnthropicProvider {
    client: reqwest::Client,
    config: AnthropicConfig,
}

impl AnthropicProvider {
    pub fn new(config: AnthropicConfig) -> Result<Self, ChatError> {
        if config.api_key.trim().is_empty() {
            return Err(ChatError::Configuration("missing API key".to_string()));
        }
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ChatError::Configuration(e.to_string()))?;
        Ok(Self { client, config })
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.config.base_url.trim_end_matches('/'))
    }
}

#[derive(Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Deserialize)]
struct WireResponse {
    #[serde(default)]
    content: Vec<WireBlock>,
}

#[derive(Deserialize)]
struct WireBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl From<WireBlock> for ContentSegment {
    fn from(block: WireBlock) -> Self {
        match (block.kind.as_str(), block.text) {
            ("text", Some(text)) => ContentSegment::Text(text),
            _ => ContentSegment::Other(block.kind),
        }
    }
}

#[async_trait]
impl ChatProvider for AnthropicProvider {
    async fn complete(&self, request: ChatRequest) -> Result<Vec<ContentSegment>, ChatError> {
        let body = WireRequest {
            model: &self.config.model,
            max_tokens: request.max_tokens,
            system: &request.system,
            messages: &request.messages,
        };

        let resp = self
            .client
            .post(self.messages_url())
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| ChatError::Upstream(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            return Err(ChatError::Upstream(format!("HTTP {}: {detail}", status.as_u16())));
        }

        let parsed: WireResponse = resp
            .json()
            .await
            .map_err(|e| ChatError::InvalidResponse(e.to_string()))?;
        Ok(parsed.content.into_iter().map(ContentSegment::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_map_to_segments() {
        let parsed: WireResponse = serde_json::from_value(serde_json::json!({
            "content": [
                {"type": "tool_use", "id": "t1", "name": "x", "input": {}},
                {"type": "text", "text": "hola"}
            ]
        }))
        .unwrap();
        let segments: Vec<ContentSegment> = parsed.content.into_iter().map(Into::into).collect();
        assert_eq!(
            segments,
            vec![
                ContentSegment::Other("tool_use".to_string()),
                ContentSegment::Text("hola".to_string())
            ]
        );
    }

    #[test]
    fn empty_key_is_a_configuration_error() {
        let err = AnthropicProvider::new(AnthropicConfig::new("  ", "model")).unwrap_err();
        assert!(matches!(err, ChatError::Configuration(_)));
    }
}
