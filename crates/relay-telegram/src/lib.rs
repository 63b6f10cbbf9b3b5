pub mod adapter;
pub mod context;
pub mod error;
pub mod handler;
pub mod markup;
pub mod send;
pub mod typing;

pub use adapter::TelegramAdapter;
pub use context::TelegramAppContext;
pub use error::TelegramError;
pub use markup::markdown_to_telegram_html;
