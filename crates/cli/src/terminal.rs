//! A [`ChatView`] that writes to the terminal.
//!
//! Finished messages are printed whole.  A pending message prints its
//! placeholder to stderr and then streams only the newly arrived suffix of
//! each update to stdout; if the final text does not extend what was
//! already shown, it is reprinted in full.

use std::collections::HashMap;
use std::io::Write;

use parking_lot::Mutex;
use tutor_chat::{ChatView, MessageId, Rendered};
use tutor_domain::Role;

#[derive(Default)]
struct State {
    next_id: MessageId,
    /// Text already written for each pending message.
    shown: HashMap<MessageId, String>,
}

#[derive(Default)]
pub struct TerminalView {
    state: Mutex<State>,
}

impl TerminalView {
    pub fn new() -> Self {
        Self::default()
    }
}

fn prefix(role: Role) -> &'static str {
    match role {
        Role::User => "you> ",
        Role::Assistant => "tutor> ",
        Role::System => "-- ",
    }
}

/// The part of `next` not yet shown, or `None` if `next` does not extend
/// `shown`.
pub fn unseen_suffix<'a>(shown: &str, next: &'a str) -> Option<&'a str> {
    next.strip_prefix(shown)
}

impl ChatView for TerminalView {
    fn append(&self, message: Rendered) -> MessageId {
        let mut state = self.state.lock();
        state.next_id += 1;
        println!("{}{}", prefix(message.role), message.text);
        state.next_id
    }

    fn begin_pending(&self, request_id: &str, placeholder: Rendered) -> MessageId {
        let mut state = self.state.lock();
        state.next_id += 1;
        let id = state.next_id;
        state.shown.insert(id, String::new());
        tracing::debug!(request_id, id, "pending message");
        eprint!("{}\r", placeholder.text);
        id
    }

    fn update(&self, id: MessageId, message: Rendered) {
        let mut state = self.state.lock();
        let Some(shown) = state.shown.get_mut(&id) else {
            return;
        };
        let mut out = std::io::stdout().lock();
        if shown.is_empty() {
            let _ = write!(out, "{}", prefix(message.role));
        }
        if let Some(delta) = unseen_suffix(shown, &message.text) {
            let _ = write!(out, "{delta}");
            *shown = message.text;
        }
        let _ = out.flush();
    }

    fn finish(&self, id: MessageId, message: Rendered) {
        let mut state = self.state.lock();
        let shown = state.shown.remove(&id).unwrap_or_default();
        if shown.is_empty() {
            println!("{}{}", prefix(message.role), message.text);
            return;
        }
        match unseen_suffix(&shown, &message.text) {
            Some(rest) => println!("{rest}"),
            None => {
                println!();
                println!("{}{}", prefix(message.role), message.text);
            }
        }
    }

    fn remove(&self, id: MessageId) {
        if let Some(shown) = self.state.lock().shown.remove(&id) {
            if !shown.is_empty() {
                println!();
            }
        }
    }

    fn clear(&self) {
        self.state.lock().shown.clear();
        println!();
        println!("──────── new conversation ────────");
    }

    fn notify(&self, notice: &str) {
        eprintln!("({notice})");
    }
}
