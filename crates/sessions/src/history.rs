//! The authoritative ordered message log for the active session.
//!
//! Entries are stored exactly as exchanged with the backend (context tags
//! included).  Display-only reconstructions never go in here.

use tutor_domain::trace::TraceEvent;
use tutor_domain::{Message, Role};

#[derive(Debug, Clone, Default)]
pub struct HistoryStore {
    entries: Vec<Message>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add to the end.  Never reorders, never deduplicates.
    pub fn append(&mut self, message: Message) {
        self.entries.push(message);
    }

    pub fn reset(&mut self) {
        self.entries.clear();
    }

    /// Replace the whole log, e.g. with a resumed server-side history.
    pub fn replace(&mut self, messages: Vec<Message>) {
        self.entries = messages;
    }

    /// Drop the oldest entries until at most `max_len` remain.  Returns
    /// how many were dropped.  User/assistant pairing is not preserved
    /// across the cut.
    pub fn trim(&mut self, max_len: usize) -> usize {
        if self.entries.len() <= max_len {
            return 0;
        }
        let dropped = self.entries.len() - max_len;
        self.entries.drain(..dropped);

        TraceEvent::HistoryTrimmed {
            dropped,
            retained: self.entries.len(),
        }
        .emit();

        dropped
    }

    pub fn messages(&self) -> &[Message] {
        &self.entries
    }

    pub fn last(&self) -> Option<&Message> {
        self.entries.last()
    }

    /// The most recent entry, if it was written by the user.
    pub fn trailing_user(&self) -> Option<&Message> {
        self.last().filter(|m| m.role == Role::User)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
