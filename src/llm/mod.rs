//! Completion client trait and implementations
//!
//! The dispatcher only sees [`CompletionClient`]; the HTTP provider lives in
//! [`openai`].

use crate::models::ChatMessage;
use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod openai;
pub use openai::OpenAiClient;

/// One chat completion call
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Token usage reported by the provider
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Usage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

#[derive(Debug, Clone)]
pub struct Completion {
    pub text: String,
    pub model: String,
    pub usage: Option<Usage>,
}

/// Trait for chat completion providers
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion>;
}
