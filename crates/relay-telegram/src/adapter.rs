//! Telegram channel adapter.
//!
//! Wraps a teloxide `Bot` + `Dispatcher` and drives the long-polling event loop
//! until the process is interrupted.

use std::sync::Arc;

use teloxide::prelude::*;
use tracing::info;

use relay_core::config::TelegramConfig;

use crate::context::TelegramAppContext;
use crate::error::TelegramError;
use crate::handler::handle_message;

/// Telegram channel adapter.
///
/// Long polling, so no public URL or webhook is required.
pub struct TelegramAdapter<C: TelegramAppContext + 'static> {
    ctx: Arc<C>,
    config: TelegramConfig,
}

impl<C: TelegramAppContext + 'static> TelegramAdapter<C> {
    pub fn new(config: &TelegramConfig, ctx: Arc<C>) -> Self {
        Self {
            ctx,
            config: config.clone(),
        }
    }

    /// Connect to Telegram and drive the long-polling loop.
    ///
    /// Fails fast if the token is missing or rejected by `getMe`; otherwise
    /// returns only after Ctrl-C stops the dispatcher.
    pub async fn run(self) -> Result<(), TelegramError> {
        if self.config.bot_token.is_empty() {
            return Err(TelegramError::NoToken);
        }
        let bot = Bot::new(&self.config.bot_token);

        let me = bot.get_me().await?;
        info!(
            username = me.user.username.as_deref().unwrap_or(""),
            "Telegram: bot started, listening for messages"
        );

        let handler = Update::filter_message().endpoint(handle_message::<C>);

        Dispatcher::builder(bot, handler)
            .dependencies(dptree::deps![Arc::clone(&self.ctx)])
            .default_handler(|_upd| async {})
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;

        info!("Telegram: dispatcher stopped");
        Ok(())
    }
}
