//! One completion round trip for an inbound message.
//!
//! `process_message` runs the whole turn under the conversation's turn lock:
//! ensure history → append user turn → trim → snapshot → completion request →
//! append assistant turn. The caller only formats and delivers the reply.

use tracing::info;

use relay_core::ConversationId;
use relay_memory::HistoryError;

use crate::provider::ProviderError;

use super::context::MessageContext;

/// Result of a completed pipeline turn.
#[derive(Debug, Clone)]
pub struct ProcessedMessage {
    /// Raw assistant reply, before any channel formatting.
    pub content: String,
    pub model: String,
    pub tokens_in: u32,
    pub tokens_out: u32,
    /// History length after the assistant turn was appended.
    pub history_len: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    History(#[from] HistoryError),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Run the completion pipeline for one user message.
///
/// On any failure the assistant turn is not appended; the user turn stays in
/// history so a retry resumes from a consistent state.
pub async fn process_message<C: MessageContext + ?Sized>(
    ctx: &C,
    conversation: &ConversationId,
    text: &str,
) -> Result<ProcessedMessage, PipelineError> {
    let history = ctx.history();
    let _turn = history.lock(conversation).await;

    if history.ensure(conversation) {
        info!(conversation = %conversation, "new conversation");
    }
    history.append_user(conversation, text)?;
    history.trim(conversation)?;

    let messages = history.snapshot(conversation)?;
    let resp = ctx.agent().complete(messages).await?;

    history.append_assistant(conversation, &resp.content)?;
    let history_len = history.len(conversation).unwrap_or(0);

    info!(
        tokens_in = resp.tokens_in,
        tokens_out = resp.tokens_out,
        model = %resp.model,
        conversation = %conversation,
        history_len,
        "pipeline: chat complete"
    );

    Ok(ProcessedMessage {
        content: resp.content,
        model: resp.model,
        tokens_in: resp.tokens_in,
        tokens_out: resp.tokens_out,
        history_len,
    })
}
