//! Stub providers and a host context for pipeline tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use relay_core::Role;
use relay_memory::HistoryStore;

use crate::pipeline::MessageContext;
use crate::provider::{ChatRequest, ChatResponse, LlmProvider, ProviderError};
use crate::runtime::AgentRuntime;

pub(crate) struct TestContext {
    pub agent: AgentRuntime,
    pub history: HistoryStore,
}

impl TestContext {
    pub fn new(provider: impl LlmProvider + 'static) -> Self {
        Self {
            agent: AgentRuntime::new(Box::new(provider), "test-model".to_string()),
            history: HistoryStore::new("sys", 8),
        }
    }
}

impl MessageContext for TestContext {
    fn agent(&self) -> &AgentRuntime {
        &self.agent
    }

    fn history(&self) -> &HistoryStore {
        &self.history
    }
}

/// Replies `echo: <last user turn>` after an optional delay and records every request.
#[derive(Default)]
pub(crate) struct EchoProvider {
    pub seen: Arc<Mutex<Vec<ChatRequest>>>,
    pub delay: Option<Duration>,
}

impl EchoProvider {
    pub fn recording() -> (Self, Arc<Mutex<Vec<ChatRequest>>>) {
        let provider = Self::default();
        let seen = Arc::clone(&provider.seen);
        (provider, seen)
    }
}

#[async_trait]
impl LlmProvider for EchoProvider {
    fn name(&self) -> &str {
        "echo"
    }

    async fn send(&self, req: &ChatRequest) -> Result<ChatResponse, ProviderError> {
        self.seen.lock().unwrap().push(req.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let last_user = req
            .messages
            .iter()
            .rev()
            .find(|t| t.role == Role::User)
            .map(|t| t.content.clone())
            .unwrap_or_default();
        Ok(ChatResponse {
            content: format!("echo: {last_user}"),
            model: req.model.clone(),
            tokens_in: 1,
            tokens_out: 1,
            finish_reason: "stop".to_string(),
        })
    }
}

/// Always answers with an upstream 500.
pub(crate) struct FailingProvider;

#[async_trait]
impl LlmProvider for FailingProvider {
    fn name(&self) -> &str {
        "always-fail"
    }

    async fn send(&self, _req: &ChatRequest) -> Result<ChatResponse, ProviderError> {
        Err(ProviderError::Upstream {
            status: 500,
            body: "intentional failure".to_string(),
        })
    }
}
