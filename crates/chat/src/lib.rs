//! `finanzas-chat`
//!
//! Stateless proxy from a dashboard conversation to an external LLM.
//!
//! The service never keeps conversation state and never retries; each
//! request is one outbound call bounded by the provider's timeout.

pub mod error;
pub mod message;
pub mod provider;
pub mod service;

pub use error::ChatError;
pub use message::{ChatMessage, ChatRole};
pub use provider::{AnthropicConfig, AnthropicProvider, ChatProvider, ChatRequest, ContentSegment};
pub use service::{ChatService, DEFAULT_MAX_TOKENS, GREETING};
