use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use relay_core::config::HistoryConfig;
use relay_core::{ConversationId, Turn};

use crate::error::HistoryError;

/// Number of oldest turns dropped by a single `trim`.
const TRIM_BATCH: usize = 2;

/// Held for the duration of one conversation turn. Dropping it releases the
/// next queued message for the same conversation.
pub type ConversationLock = OwnedMutexGuard<()>;

/// In-memory conversation histories keyed by conversation id.
///
/// Thread-safe: each history lives in a `DashMap` shard, so conversations do
/// not contend with each other. A separate table of per-conversation async
/// mutexes lets callers serialize a whole turn (append → request → append)
/// for one id via [`HistoryStore::lock`]. Nothing is persisted.
pub struct HistoryStore {
    histories: DashMap<ConversationId, Vec<Turn>>,
    turn_locks: DashMap<ConversationId, Arc<Mutex<()>>>,
    system_prompt: String,
    max_turns: usize,
}

impl HistoryStore {
    pub fn new(system_prompt: impl Into<String>, max_turns: usize) -> Self {
        Self {
            histories: DashMap::new(),
            turn_locks: DashMap::new(),
            system_prompt: system_prompt.into(),
            max_turns,
        }
    }

    pub fn from_config(config: &HistoryConfig) -> Self {
        Self::new(config.system_prompt.clone(), config.max_turns)
    }

    pub fn max_turns(&self) -> usize {
        self.max_turns
    }

    /// Acquire the turn lock for `id`, waiting for any in-flight turn on the
    /// same conversation to finish first.
    pub async fn lock(&self, id: &ConversationId) -> ConversationLock {
        let mutex = Arc::clone(self.turn_locks.entry(id.clone()).or_default().value());
        mutex.lock_owned().await
    }

    /// Seed a history with the system instruction if none exists.
    ///
    /// Returns `true` when a new history was created.
    pub fn ensure(&self, id: &ConversationId) -> bool {
        match self.histories.entry(id.clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(vec![Turn::system(self.system_prompt.clone())]);
                debug!(conversation = %id, "history created");
                true
            }
        }
    }

    pub fn append_user(&self, id: &ConversationId, text: &str) -> Result<(), HistoryError> {
        self.push(id, Turn::user(text))
    }

    pub fn append_assistant(&self, id: &ConversationId, text: &str) -> Result<(), HistoryError> {
        self.push(id, Turn::assistant(text))
    }

    /// Drop the two oldest turns if the history is over `max_turns`.
    ///
    /// Removes at most one batch per call, however far over the bound the
    /// history is. Returns the number of turns removed (0 or 2).
    pub fn trim(&self, id: &ConversationId) -> Result<usize, HistoryError> {
        let mut history = self
            .histories
            .get_mut(id)
            .ok_or_else(|| not_found(id))?;

        if history.len() <= self.max_turns {
            return Ok(0);
        }

        let removed = TRIM_BATCH.min(history.len());
        history.drain(..removed);
        debug!(conversation = %id, removed, remaining = history.len(), "history trimmed");
        Ok(removed)
    }

    /// Remove the whole history. Returns whether one existed.
    pub fn clear(&self, id: &ConversationId) -> bool {
        let existed = self.histories.remove(id).is_some();
        debug!(conversation = %id, existed, "history cleared");
        existed
    }

    /// Ordered copy of the history, ready to send as completion messages.
    pub fn snapshot(&self, id: &ConversationId) -> Result<Vec<Turn>, HistoryError> {
        self.histories
            .get(id)
            .map(|history| history.clone())
            .ok_or_else(|| not_found(id))
    }

    pub fn len(&self, id: &ConversationId) -> Option<usize> {
        self.histories.get(id).map(|history| history.len())
    }

    /// Drop the turn lock for `id` if no task holds or awaits it.
    ///
    /// Call after the guard is released; a lock still in use stays put.
    pub fn release_idle_lock(&self, id: &ConversationId) -> bool {
        let released = self
            .turn_locks
            .remove_if(id, |_, mutex| Arc::strong_count(mutex) == 1)
            .is_some();
        if released {
            debug!(conversation = %id, "turn lock released");
        }
        released
    }

    /// Number of per-conversation turn locks currently allocated.
    pub fn lock_count(&self) -> usize {
        self.turn_locks.len()
    }

    /// Number of conversations currently held in memory.
    pub fn conversation_count(&self) -> usize {
        self.histories.len()
    }

    fn push(&self, id: &ConversationId, turn: Turn) -> Result<(), HistoryError> {
        let mut history = self
            .histories
            .get_mut(id)
            .ok_or_else(|| not_found(id))?;
        history.push(turn);
        Ok(())
    }
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::from_config(&HistoryConfig::default())
    }
}

fn not_found(id: &ConversationId) -> HistoryError {
    HistoryError::NotFound { id: id.clone() }
}
