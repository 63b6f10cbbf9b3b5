use thiserror::Error;

use relay_core::ConversationId;

#[derive(Debug, Error)]
pub enum HistoryError {
    /// The conversation was never seeded with `ensure` (or was cleared since).
    #[error("conversation history not found: {id}")]
    NotFound { id: ConversationId },
}
