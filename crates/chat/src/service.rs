use std::sync::Arc;

use tracing::{debug, error};

use crate::error::ChatError;
use crate::message::{ChatMessage, ChatRole};
use crate::provider::{ChatProvider, ChatRequest, ContentSegment};

pub const GREETING: &str = "¡Hola! Soy tu asistente financiero. ¿En qué puedo ayudarte hoy?";
pub const DEFAULT_MAX_TOKENS: u32 = 1024;

/// Forwards a transcript to a [`ChatProvider`].
///
/// Cloning is cheap and shares the provider.
#[derive(Clone)]
pub struct ChatService {
    provider: Option<Arc<dyn ChatProvider>>,
    max_tokens: u32,
}

impl core::fmt::Debug for ChatService {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ChatService")
            .field("configured", &self.provider.is_some())
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl ChatService {
    pub fn new(provider: Arc<dyn ChatProvider>) -> Self {
        Self {
            provider: Some(provider),
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    /// Service without a provider. Malformed transcripts still get the
    /// greeting; anything that needs the provider fails with
    /// [`ChatError::Configuration`].
    pub fn unconfigured() -> Self {
        Self {
            provider: None,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub async fn send_chat(&self, messages: &[ChatMessage], system_context: &str) -> Result<String, ChatError> {
        let conversation: Vec<ChatMessage> = messages
            .iter()
            .filter(|m| m.role.is_conversational())
            .cloned()
            .collect();

        if conversation.first().map(|m| m.role) != Some(ChatRole::User) {
            debug!(received = messages.len(), "transcript not replayable; answering with greeting");
            return Ok(GREETING.to_string());
        }

        let provider = self
            .provider
            .as_ref()
            .ok_or_else(|| ChatError::Configuration("no chat provider configured".to_string()))?;

        let request = ChatRequest {
            system: system_context.to_string(),
            messages: conversation,
            max_tokens: self.max_tokens,
        };
        let turns = request.messages.len();

        let segments = provider.complete(request).await.map_err(|err| {
            error!(error = %err, turns, "chat provider call failed");
            err
        })?;

        Ok(match segments.into_iter().next() {
            Some(ContentSegment::Text(text)) => text,
            _ => String::new(),
        })
    }
}
