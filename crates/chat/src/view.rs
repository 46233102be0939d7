//! The display surface a controller writes into.
//!
//! [`ChatView`] is the seam between the chat logic and whatever renders
//! it (a terminal, a test harness).  [`MessageList`] is the in-memory
//! implementation used by tests and by callers that want a snapshot of
//! what is on screen.

use parking_lot::RwLock;
use tutor_domain::Role;

use crate::render::render;

pub type MessageId = u64;

/// A message ready for display: its role, the raw text, and the markup
/// produced by [`render`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub role: Role,
    pub text: String,
    pub markup: String,
}

impl Rendered {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        let text = text.into();
        let markup = render(role, &text);
        Self { role, text, markup }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, text)
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(Role::System, text)
    }
}

/// Display operations.  Every mutation that adds content scrolls the
/// view to its end.
pub trait ChatView: Send + Sync {
    /// Append a finished message.
    fn append(&self, message: Rendered) -> MessageId;

    /// Append a placeholder owned by the turn with `request_id`.
    fn begin_pending(&self, request_id: &str, placeholder: Rendered) -> MessageId;

    /// Replace the content of a pending message with progressive text.
    fn update(&self, id: MessageId, message: Rendered);

    /// Replace the content of a pending message and mark it final.
    fn finish(&self, id: MessageId, message: Rendered);

    fn remove(&self, id: MessageId);

    /// Remove every message.
    fn clear(&self);

    /// Show a transient notice outside the message list.
    fn notify(&self, notice: &str);
}

/// One entry in a [`MessageList`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayEntry {
    pub id: MessageId,
    /// Set for entries created through [`ChatView::begin_pending`].
    pub request_id: Option<String>,
    pub rendered: Rendered,
    pub pending: bool,
}

#[derive(Debug, Default)]
struct ListState {
    next_id: MessageId,
    entries: Vec<DisplayEntry>,
    notices: Vec<String>,
    scrolled_to: Option<MessageId>,
}

impl ListState {
    fn push(&mut self, request_id: Option<String>, rendered: Rendered, pending: bool) -> MessageId {
        self.next_id += 1;
        let id = self.next_id;
        self.entries.push(DisplayEntry {
            id,
            request_id,
            rendered,
            pending,
        });
        self.scrolled_to = Some(id);
        id
    }

    fn entry_mut(&mut self, id: MessageId) -> Option<&mut DisplayEntry> {
        self.entries.iter_mut().find(|e| e.id == id)
    }

    fn scroll_to_end(&mut self) {
        self.scrolled_to = self.entries.last().map(|e| e.id);
    }
}

/// In-memory [`ChatView`].
#[derive(Debug, Default)]
pub struct MessageList {
    state: RwLock<ListState>,
}

impl MessageList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the current entries, in display order.
    pub fn snapshot(&self) -> Vec<DisplayEntry> {
        self.state.read().entries.clone()
    }

    pub fn notices(&self) -> Vec<String> {
        self.state.read().notices.clone()
    }

    /// The entry the view was last scrolled to.
    pub fn scrolled_to(&self) -> Option<MessageId> {
        self.state.read().scrolled_to
    }

    pub fn pending_count(&self) -> usize {
        self.state.read().entries.iter().filter(|e| e.pending).count()
    }

    /// Raw text of every entry, in order.
    pub fn texts(&self) -> Vec<(Role, String)> {
        self.state
            .read()
            .entries
            .iter()
            .map(|e| (e.rendered.role, e.rendered.text.clone()))
            .collect()
    }
}

impl ChatView for MessageList {
    fn append(&self, message: Rendered) -> MessageId {
        self.state.write().push(None, message, false)
    }

    fn begin_pending(&self, request_id: &str, placeholder: Rendered) -> MessageId {
        self.state
            .write()
            .push(Some(request_id.to_owned()), placeholder, true)
    }

    fn update(&self, id: MessageId, message: Rendered) {
        let mut state = self.state.write();
        if let Some(entry) = state.entry_mut(id) {
            entry.rendered = message;
        }
        state.scroll_to_end();
    }

    fn finish(&self, id: MessageId, message: Rendered) {
        let mut state = self.state.write();
        if let Some(entry) = state.entry_mut(id) {
            entry.rendered = message;
            entry.pending = false;
        }
        state.scroll_to_end();
    }

    fn remove(&self, id: MessageId) {
        let mut state = self.state.write();
        state.entries.retain(|e| e.id != id);
        state.scroll_to_end();
    }

    fn clear(&self) {
        let mut state = self.state.write();
        state.entries.clear();
        state.scrolled_to = None;
    }

    fn notify(&self, notice: &str) {
        self.state.write().notices.push(notice.to_owned());
    }
}
