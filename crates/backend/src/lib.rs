//! `tutor-backend`: client for the tutoring web backend.
//!
//! Provides the [`TutorBackend`] trait (chat, streaming, and session
//! persistence endpoints) and the [`ProgressBackend`] trait (progress
//! widget endpoints), a production REST implementation ([`RestBackend`])
//! over `reqwest`, server-sent-event framing, and typed DTOs matching the
//! backend's JSON contracts.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use tutor_domain::config::BackendConfig;
//! use tutor_backend::{RestBackend, TutorBackend};
//!
//! # async fn example() -> tutor_domain::Result<()> {
//! let client = RestBackend::new(&BackendConfig::default())?;
//! let messages = client.recent_messages("sess_123").await?;
//! println!("{} messages on record", messages.len());
//! # Ok(())
//! # }
//! ```

pub mod provider;
pub mod rest;
pub mod sse;
pub mod types;

pub use provider::{ProgressBackend, TutorBackend};
pub use rest::{from_reqwest, RestBackend};
pub use types::{
    AcceptResponse, ActivityData, ActivityDay, ChatRequest, ExamPdfRequest, InitialPromptRequest,
    RateTopicRequest, RecordExamRequest, StreakUpdate, TopicProgress, TrackActivityRequest,
};
