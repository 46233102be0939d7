//! Client-side session state for the tutor.
//!
//! A durable key-value [`LocalStore`] (the equivalent of browser local
//! storage) holding the backend-assigned session ID per topic plus a few
//! UI preferences, and the in-memory [`HistoryStore`] that mirrors the
//! server-side conversation record.

pub mod history;
pub mod local_store;
pub mod session_key;

pub use history::HistoryStore;
pub use local_store::LocalStore;
pub use session_key::{session_storage_key, CHAT_COLLAPSED_KEY, PANEL_DOCKED_KEY};
