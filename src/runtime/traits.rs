//! Trait abstractions for runtime I/O
//!
//! These traits enable testing the runtime with mock implementations.

use crate::config::LlmConfig;
use crate::llm::{LlmError, LlmService};
use crate::reply::Menu;
use crate::session::UserId;
use crate::system_prompt::Prompt;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Where replies to an inbound event go
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyTarget {
    pub chat_id: i64,
    /// Message whose button produced the event; the first reply edits it
    pub origin_message_id: Option<i64>,
}

impl ReplyTarget {
    pub fn chat(chat_id: i64) -> Self {
        Self {
            chat_id,
            origin_message_id: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundKind {
    Start,
    Text(String),
    Selection(String),
}

/// One message from the transport, already stripped of platform details
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    pub user_id: UserId,
    pub target: ReplyTarget,
    pub kind: InboundKind,
}

/// Client for generating answers
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Produce the assistant's reply text for a prompt
    async fn generate(&self, prompt: &Prompt) -> Result<String, LlmError>;

    fn model_id(&self) -> &str;
}

/// Delivery of replies to the messaging platform
#[async_trait]
pub trait OutboundSink: Send + Sync {
    async fn send_text(&self, target: &ReplyTarget, text: &str) -> Result<(), String>;

    /// Prompt plus selectable options
    async fn send_menu(&self, target: &ReplyTarget, menu: &Menu) -> Result<(), String>;

    /// Transient "typing" indicator
    async fn send_typing(&self, target: &ReplyTarget) -> Result<(), String>;
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: LlmClient + ?Sized> LlmClient for Arc<T> {
    async fn generate(&self, prompt: &Prompt) -> Result<String, LlmError> {
        (**self).generate(prompt).await
    }

    fn model_id(&self) -> &str {
        (**self).model_id()
    }
}

#[async_trait]
impl<T: OutboundSink + ?Sized> OutboundSink for Arc<T> {
    async fn send_text(&self, target: &ReplyTarget, text: &str) -> Result<(), String> {
        (**self).send_text(target, text).await
    }

    async fn send_menu(&self, target: &ReplyTarget, menu: &Menu) -> Result<(), String> {
        (**self).send_menu(target, menu).await
    }

    async fn send_typing(&self, target: &ReplyTarget) -> Result<(), String> {
        (**self).send_typing(target).await
    }
}

// ============================================================================
// Production Adapters
// ============================================================================

/// Adapter to use an `LlmService` as `LlmClient`
pub struct ServiceLlmClient {
    service: Arc<dyn LlmService>,
    max_tokens: u32,
    temperature: f32,
    timeout: Duration,
}

impl ServiceLlmClient {
    pub fn new(service: Arc<dyn LlmService>, config: &LlmConfig) -> Self {
        Self {
            service,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            timeout: config.timeout,
        }
    }
}

#[async_trait]
impl LlmClient for ServiceLlmClient {
    async fn generate(&self, prompt: &Prompt) -> Result<String, LlmError> {
        let request = prompt.to_request(Some(self.max_tokens), Some(self.temperature));
        match tokio::time::timeout(self.timeout, self.service.complete(&request)).await {
            Ok(response) => Ok(response?.text.trim().to_string()),
            Err(_) => Err(LlmError::timeout(format!(
                "No response within {}s",
                self.timeout.as_secs()
            ))),
        }
    }

    fn model_id(&self) -> &str {
        self.service.model_id()
    }
}
