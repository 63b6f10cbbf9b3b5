//! Fixed commands, intercepted before the completion pipeline.
//!
//! Matching is on the whole message text, exact and case-sensitive, with no
//! arguments: `/start` and `/clear` are commands, `/Start` or `/clear all`
//! are ordinary messages that go to the model.

use tracing::info;

use relay_core::ConversationId;

use super::context::MessageContext;
use super::texts;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Show the welcome text.
    Start,
    /// Forget this conversation's history.
    Clear,
}

impl Command {
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "/start" => Some(Command::Start),
            "/clear" => Some(Command::Clear),
            _ => None,
        }
    }
}

/// Handle a fixed command.
///
/// Returns `Some(reply)` if `text` was a command, `None` if it should be
/// forwarded to the completion pipeline.
pub async fn handle_command<C: MessageContext + ?Sized>(
    ctx: &C,
    conversation: &ConversationId,
    text: &str,
) -> Option<String> {
    let command = Command::parse(text)?;

    let reply = match command {
        Command::Start => texts::WELCOME,
        Command::Clear => {
            // Wait for an in-flight turn so its assistant reply is not lost mid-clear.
            let existed = {
                let _turn = ctx.history().lock(conversation).await;
                ctx.history().clear(conversation)
            };
            ctx.history().release_idle_lock(conversation);
            info!(conversation = %conversation, existed, "history cleared via /clear");
            if existed {
                texts::HISTORY_CLEARED
            } else {
                texts::HISTORY_ALREADY_EMPTY
            }
        }
    };

    Some(reply.to_string())
}

#[cfg(test)]
mod tests {
    use relay_core::Turn;

    use super::*;
    use crate::pipeline::process_message;
    use crate::pipeline::test_support::{EchoProvider, TestContext};

    fn ctx() -> TestContext {
        TestContext::new(EchoProvider::default())
    }

    #[test]
    fn parse_is_exact_and_case_sensitive() {
        assert_eq!(Command::parse("/start"), Some(Command::Start));
        assert_eq!(Command::parse("/clear"), Some(Command::Clear));
        assert_eq!(Command::parse("/START"), None);
        assert_eq!(Command::parse("/clear all"), None);
        assert_eq!(Command::parse(" /start"), None);
        assert_eq!(Command::parse("/help"), None);
        assert_eq!(Command::parse(""), None);
    }

    #[tokio::test]
    async fn start_returns_welcome_without_touching_history() {
        let ctx = ctx();
        let id = ConversationId::from("1");

        let reply = handle_command(&ctx, &id, "/start").await;
        assert_eq!(reply.as_deref(), Some(texts::WELCOME));
        assert_eq!(ctx.history.len(&id), None);
    }

    #[tokio::test]
    async fn clear_without_history_says_already_empty() {
        let ctx = ctx();
        let id = ConversationId::from("1");

        let reply = handle_command(&ctx, &id, "/clear").await;
        assert_eq!(reply.as_deref(), Some(texts::HISTORY_ALREADY_EMPTY));
    }

    #[tokio::test]
    async fn clear_removes_history_and_next_message_starts_fresh() {
        let ctx = ctx();
        let id = ConversationId::from("1");
        process_message(&ctx, &id, "remember me").await.unwrap();

        let reply = handle_command(&ctx, &id, "/clear").await;
        assert_eq!(reply.as_deref(), Some(texts::HISTORY_CLEARED));
        assert_eq!(ctx.history.len(&id), None);
        assert_eq!(ctx.history.lock_count(), 0);

        process_message(&ctx, &id, "who am i").await.unwrap();
        let turns = ctx.history.snapshot(&id).unwrap();
        assert_eq!(turns[0], Turn::system("sys"));
        assert_eq!(turns.len(), 3);
    }

    #[tokio::test]
    async fn non_commands_fall_through() {
        let ctx = ctx();
        let id = ConversationId::from("1");

        assert!(handle_command(&ctx, &id, "hello").await.is_none());
        assert!(handle_command(&ctx, &id, "/Clear").await.is_none());
    }
}
