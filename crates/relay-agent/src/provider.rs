use async_trait::async_trait;
use serde::Serialize;

use relay_core::Turn;

/// Request to a chat-completion provider.
///
/// Serializes to exactly `{"model": ..., "messages": [...]}`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    /// Full ordered conversation, system turn first.
    pub messages: Vec<Turn>,
}

/// Response from a chat-completion provider.
#[derive(Debug, Clone)]
pub struct ChatResponse {
    pub content: String,
    pub model: String,
    pub tokens_in: u32,
    pub tokens_out: u32,
    pub finish_reason: String,
}

/// Common interface for completion back ends.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name for logging and error messages.
    fn name(&self) -> &str;

    /// Send a chat request and wait for the full response.
    async fn send(&self, req: &ChatRequest) -> Result<ChatResponse, ProviderError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// Could not reach the API at all (DNS, TLS, proxy, connection reset).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The API answered with a non-2xx status.
    #[error("upstream error ({status}): {body}")]
    Upstream { status: u16, body: String },

    /// The API answered 2xx but the body is not a usable completion.
    #[error("malformed upstream response: {0}")]
    MalformedResponse(String),
}
