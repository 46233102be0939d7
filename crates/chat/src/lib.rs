//! `tutor-chat`: the streaming chat session controller.
//!
//! One [`SessionController`] is built per page load (per topic).  On
//! [`start`](SessionController::start) it resumes a persisted session or
//! sends a fresh templated prompt; afterwards the view layer drives it
//! through three intents: [`send_message`](SessionController::send_message),
//! [`change_mode`](SessionController::change_mode) and
//! [`reset`](SessionController::reset).
//!
//! Each turn runs a [`StreamConsumer`]: POST the prompt with a fresh
//! request ID, subscribe to that ID's event stream, accumulate fragments
//! into a placeholder, and finalize.  Rendering goes through
//! [`render`](render::render) and lands in a [`ChatView`].

pub mod controller;
pub mod prompt;
pub mod render;
pub mod request_id;
pub mod resolver;
pub mod stream;
pub mod view;

pub use controller::SessionController;
pub use prompt::{strip_context, OutboundPrompt};
pub use request_id::next_request_id;
pub use resolver::{FreshReason, Resolution};
pub use stream::{StreamConsumer, TurnOutcome, TurnRequest, TurnState};
pub use view::{ChatView, DisplayEntry, MessageId, MessageList, Rendered};
