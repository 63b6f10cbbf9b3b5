//! "typing…" chat action, refreshed while a reply is being generated.
//!
//! Telegram drops the status after about 5 seconds, so it is re-sent every 4.

use std::time::Duration;

use teloxide::prelude::*;
use teloxide::types::ChatAction;
use tracing::debug;

const REFRESH: Duration = Duration::from_secs(4);

/// Background typing indicator for one chat.
///
/// The loop is aborted on `stop()` or when the handle is dropped, so an early
/// return from the handler never leaves it running.
pub struct TypingHandle(tokio::task::JoinHandle<()>);

impl TypingHandle {
    pub fn start(bot: Bot, chat_id: ChatId) -> Self {
        let handle = tokio::spawn(async move {
            loop {
                if let Err(e) = bot.send_chat_action(chat_id, ChatAction::Typing).await {
                    debug!(error = %e, chat_id = chat_id.0, "typing indicator failed");
                }
                tokio::time::sleep(REFRESH).await;
            }
        });
        TypingHandle(handle)
    }

    pub fn stop(self) {
        drop(self);
    }
}

impl Drop for TypingHandle {
    fn drop(&mut self) {
        self.0.abort();
    }
}
