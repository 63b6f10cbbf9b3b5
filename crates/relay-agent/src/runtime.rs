use tracing::info;

use relay_core::Turn;

use crate::provider::{ChatRequest, ChatResponse, LlmProvider, ProviderError};

/// Holds the completion provider and the model every request uses.
/// Shared across handlers via the host context.
pub struct AgentRuntime {
    provider: Box<dyn LlmProvider>,
    model: String,
}

impl AgentRuntime {
    pub fn new(provider: Box<dyn LlmProvider>, model: String) -> Self {
        Self { provider, model }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn provider(&self) -> &dyn LlmProvider {
        &*self.provider
    }

    /// Send `messages` as one completion request and wait for the reply.
    pub async fn complete(&self, messages: Vec<Turn>) -> Result<ChatResponse, ProviderError> {
        let req = ChatRequest {
            model: self.model.clone(),
            messages,
        };
        info!(
            model = %req.model,
            provider = %self.provider.name(),
            messages = req.messages.len(),
            "processing chat request"
        );
        self.provider.send(&req).await
    }
}
