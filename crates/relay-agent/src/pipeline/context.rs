//! Shared context interface for channel adapters.

use relay_memory::HistoryStore;

use crate::runtime::AgentRuntime;

/// Minimal context the pipeline needs from its host.
///
/// The host owns both subsystems for the lifetime of the process; nothing in
/// the pipeline keeps global state of its own.
pub trait MessageContext: Send + Sync {
    fn agent(&self) -> &AgentRuntime;
    fn history(&self) -> &HistoryStore;
}
