use relay_agent::pipeline::MessageContext;
use relay_agent::runtime::AgentRuntime;
use relay_memory::HistoryStore;

/// Process-wide state shared by every chat, passed as `Arc<AppState>` to the adapter.
pub struct AppState {
    pub agent: AgentRuntime,
    pub history: HistoryStore,
}

impl AppState {
    pub fn new(agent: AgentRuntime, history: HistoryStore) -> Self {
        Self { agent, history }
    }
}

impl MessageContext for AppState {
    fn agent(&self) -> &AgentRuntime {
        &self.agent
    }

    fn history(&self) -> &HistoryStore {
        &self.history
    }
}
