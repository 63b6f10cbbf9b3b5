//! Channel-agnostic message pipeline.
//!
//! Channel adapters call `handle_command` first and, when it declines,
//! `process_message` for the completion round trip. They only add their own
//! delivery and formatting on top.

pub mod commands;
pub mod context;
pub mod process;
pub mod texts;

#[cfg(test)]
pub(crate) mod test_support;

pub use commands::{handle_command, Command};
pub use context::MessageContext;
pub use process::{process_message, PipelineError, ProcessedMessage};
