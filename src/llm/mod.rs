//! Streaming access to code-generating models.

mod client;
mod registry;
mod sse;

pub use client::OpenAiCompatClient;
pub use registry::{default_models, DefaultProvider, Endpoint, ModelEntry, ModelRegistry, MAX_TOKENS};
pub use sse::{SseData, SseLineDecoder};

use async_trait::async_trait;
use futures::stream::BoxStream;
use thiserror::Error;

use crate::session::ChatMessage;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Model configuration not found for model: {0}")]
    UnknownModel(String),

    #[error("Model request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Model provider returned {status}: {body}")]
    Status { status: u16, body: String },
}

/// Text deltas of one completion, in order.
pub type TokenStream = BoxStream<'static, Result<String, LlmError>>;

#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model: ModelEntry,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
}

impl CompletionRequest {
    pub fn new(model: ModelEntry, messages: Vec<ChatMessage>) -> Self {
        let max_tokens = model.effective_max_tokens();
        Self {
            model,
            messages,
            max_tokens,
        }
    }
}

#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn stream_chat(&self, request: CompletionRequest) -> Result<TokenStream, LlmError>;
}
