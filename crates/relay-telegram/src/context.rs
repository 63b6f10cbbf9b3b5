//! Host interface the Telegram adapter needs from the binary.
//!
//! Same trait the pipeline runs against, so the adapter never reaches past
//! `relay-agent` for history or completions.

pub use relay_agent::pipeline::MessageContext as TelegramAppContext;
