pub mod error;
pub mod history;

pub use error::HistoryError;
pub use history::{ConversationLock, HistoryStore};
