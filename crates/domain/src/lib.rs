//! Shared types for the tutor client workspace: the error enum,
//! configuration, conversation messages, topics and modes, server-sent
//! stream events, and structured trace events.

pub mod config;
pub mod error;
pub mod message;
pub mod stream;
pub mod topic;
pub mod trace;

pub use error::{Error, Result};
pub use message::{Message, Role};
pub use stream::{BoxStream, ServerEvent};
pub use topic::{Mode, Topic};
