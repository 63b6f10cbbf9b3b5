//! Telegram message handler registered in the teloxide Dispatcher.

use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::ParseMode;
use tracing::{info, warn};

use relay_agent::pipeline::{handle_command, process_message, texts};
use relay_core::ConversationId;

use crate::context::TelegramAppContext;
use crate::markup::markdown_to_telegram_html;
use crate::send;
use crate::typing::TypingHandle;

/// Main message handler registered in the teloxide Dispatcher.
///
/// Runs for every incoming `Message`:
/// 1. Skip messages without text (stickers, photos, service messages)
/// 2. Intercept `/start` and `/clear`
/// 3. Post the "processing" placeholder and start the typing indicator
/// 4. Run the completion pipeline
/// 5. Replace the placeholder with the formatted reply, or the apology
///
/// The pipeline is awaited in place rather than spawned. The Dispatcher
/// already runs different chats concurrently and keeps one chat's updates in
/// order, which is the order its history must see them in.
pub async fn handle_message<C: TelegramAppContext + 'static>(
    bot: Bot,
    msg: Message,
    ctx: Arc<C>,
) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };

    let chat_id = msg.chat.id;
    let username = msg
        .from
        .as_ref()
        .and_then(|u| u.username.as_deref())
        .unwrap_or("");
    info!(chat_id = chat_id.0, username, text, "Telegram: inbound message");

    let conversation = conversation_id(chat_id);

    if let Some(reply) = handle_command(ctx.as_ref(), &conversation, text).await {
        bot.send_message(chat_id, reply).await?;
        return Ok(());
    }

    run_turn(&bot, chat_id, ctx.as_ref(), &conversation, text).await;
    Ok(())
}

/// Placeholder → pipeline → edited reply (or apology) for one non-command message.
async fn run_turn<C: TelegramAppContext + ?Sized>(
    bot: &Bot,
    chat_id: ChatId,
    ctx: &C,
    conversation: &ConversationId,
    text: &str,
) {
    let placeholder = match bot
        .send_message(chat_id, texts::PROCESSING)
        .parse_mode(ParseMode::Html)
        .await
    {
        Ok(m) => m,
        Err(e) => {
            // Nothing to edit later; tell the user instead of going silent.
            warn!(error = %e, chat_id = chat_id.0, "Telegram: failed to post placeholder");
            if let Err(e) = bot.send_message(chat_id, texts::APOLOGY).await {
                warn!(error = %e, chat_id = chat_id.0, "Telegram: failed to deliver apology");
            }
            return;
        }
    };

    let typing = TypingHandle::start(bot.clone(), chat_id);
    let result = process_message(ctx, conversation, text).await;
    typing.stop();

    match result {
        Ok(pm) => {
            info!(
                chat_id = chat_id.0,
                model = %pm.model,
                history_len = pm.history_len,
                "Telegram: reply ready"
            );
            let html = markdown_to_telegram_html(&pm.content);
            send::deliver_reply(bot, chat_id, placeholder.id, &pm.content, &html).await;
        }
        Err(e) => {
            warn!(error = %e, conversation = %conversation, "Telegram: pipeline error");
            send::deliver_apology(bot, chat_id, placeholder.id).await;
        }
    }
}

/// History key for a chat. One conversation per chat, shared by everyone in it.
pub fn conversation_id(chat_id: ChatId) -> ConversationId {
    ConversationId::new(chat_id.0.to_string())
}
