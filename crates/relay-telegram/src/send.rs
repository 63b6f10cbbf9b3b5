//! Reply delivery for the Telegram adapter.
//!
//! A reply replaces the "processing" placeholder via `editMessageText` in
//! HTML parse mode. If Telegram rejects that edit (bad markup, or the reply is
//! over the 4096-character limit) the raw reply is delivered as plain text in
//! fence-aware chunks instead.

use std::time::Duration;

use teloxide::prelude::*;
use teloxide::types::{MessageId, ParseMode};
use tracing::warn;

use relay_agent::pipeline::texts;

/// Maximum characters per Telegram message (limit is 4096; we use 4090 for safety).
const CHUNK_MAX: usize = 4090;

/// Pause between consecutive chunks to stay under Telegram's rate limits.
const CHUNK_DELAY: Duration = Duration::from_millis(100);

const FENCE_CLOSE: &str = "\n```";

/// Code-fence-aware message splitter.
///
/// Splits on line boundaries. When a split falls inside a fenced code block,
/// the fence is closed before the chunk boundary and re-opened (with its
/// language tag) at the start of the next chunk.
pub fn split_chunks_smart(text: &str) -> Vec<String> {
    if text.len() <= CHUNK_MAX {
        return vec![text.to_string()];
    }

    let mut chunks: Vec<String> = Vec::new();
    let mut current = String::new();
    // `current` holds no line yet. Tracked separately from `is_empty()` so
    // blank lines keep their separators.
    let mut fresh = true;
    let mut fence_lang: Option<String> = None;

    for line in text.split('\n') {
        // Leave room for the closing "\n```" when splitting inside a fence.
        let budget = if fence_lang.is_some() {
            CHUNK_MAX - FENCE_CLOSE.len()
        } else {
            CHUNK_MAX
        };

        if !fresh && current.len() + 1 + line.len() > budget {
            if fence_lang.is_some() {
                current.push_str(FENCE_CLOSE);
            }
            chunks.push(std::mem::take(&mut current));
            fresh = true;
            if let Some(lang) = &fence_lang {
                current.push_str("```");
                current.push_str(lang);
                fresh = false;
            }
        }

        if !fresh {
            current.push('\n');
        }
        current.push_str(line);
        fresh = false;

        if let Some(after_fence) = line.trim_start().strip_prefix("```") {
            fence_lang = match fence_lang {
                Some(_) => None,
                None => Some(after_fence.trim().to_string()),
            };
        }
    }

    if !fresh {
        chunks.push(current);
    }

    // A single line longer than CHUNK_MAX still needs a hard split.
    chunks.into_iter().flat_map(|chunk| force_split(&chunk)).collect()
}

fn force_split(chunk: &str) -> Vec<String> {
    let mut result = Vec::new();
    let mut remaining = chunk;
    while remaining.len() > CHUNK_MAX {
        let limit = floor_char_boundary(remaining, CHUNK_MAX);
        let head = &remaining[..limit];
        let split_at = head
            .rfind('\n')
            .or_else(|| head.rfind(' '))
            .filter(|&i| i > 0)
            .unwrap_or(limit);
        result.push(remaining[..split_at].to_string());
        remaining = remaining[split_at..].trim_start();
    }
    if !remaining.is_empty() {
        result.push(remaining.to_string());
    }
    result
}

/// Largest byte index `<= index` that falls on a char boundary.
fn floor_char_boundary(s: &str, index: usize) -> usize {
    let mut i = index.min(s.len());
    while !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

/// Replace the placeholder with the formatted reply.
///
/// Falls back to plain-text chunks when Telegram refuses the HTML edit.
pub async fn deliver_reply(
    bot: &Bot,
    chat_id: ChatId,
    placeholder: MessageId,
    raw: &str,
    html: &str,
) {
    let edited = bot
        .edit_message_text(chat_id, placeholder, html)
        .parse_mode(ParseMode::Html)
        .await;

    let Err(e) = edited else {
        return;
    };
    warn!(error = %e, chat_id = chat_id.0, "Telegram: HTML edit rejected, falling back to plain text");

    let chunks = split_chunks_smart(raw);
    for (i, chunk) in chunks.iter().enumerate() {
        let sent = if i == 0 {
            bot.edit_message_text(chat_id, placeholder, chunk)
                .await
                .map(|_| ())
        } else {
            tokio::time::sleep(CHUNK_DELAY).await;
            bot.send_message(chat_id, chunk).await.map(|_| ())
        };
        if let Err(e) = sent {
            warn!(error = %e, chunk_index = i, "Telegram: failed to send plain-text fallback");
        }
    }
}

/// Replace the placeholder with the fixed apology, or send it fresh if the edit fails.
pub async fn deliver_apology(bot: &Bot, chat_id: ChatId, placeholder: MessageId) {
    if bot
        .edit_message_text(chat_id, placeholder, texts::APOLOGY)
        .await
        .is_ok()
    {
        return;
    }
    if let Err(e) = bot.send_message(chat_id, texts::APOLOGY).await {
        warn!(error = %e, chat_id = chat_id.0, "Telegram: failed to deliver apology");
    }
}
