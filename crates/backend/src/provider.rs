//! The backend traits.  [`TutorBackend`] covers the chat controller's
//! collaborators; [`ProgressBackend`] covers the progress widgets.

use async_trait::async_trait;
use tutor_domain::error::Result;
use tutor_domain::{BoxStream, Message, ServerEvent};

use crate::types::{
    AcceptResponse, ActivityData, ChatRequest, ExamPdfRequest, InitialPromptRequest,
    RateTopicRequest, RecordExamRequest, StreakUpdate, TopicProgress, TrackActivityRequest,
};

/// Abstraction over the chat and session endpoints.
///
/// Implementations may talk to the real REST API or a test double.
#[async_trait]
pub trait TutorBackend: Send + Sync {
    /// Ask the backend to start generating the opening turn for a topic
    /// (POST /student/initial-prompt).
    async fn initial_prompt(&self, req: InitialPromptRequest) -> Result<AcceptResponse>;

    /// Ask the backend to start generating a reply to a question
    /// (POST /student/chat).
    async fn chat(&self, req: ChatRequest) -> Result<AcceptResponse>;

    /// Open the event stream for one request ID
    /// (GET /student/chat-stream?requestId=...).  Dropping the stream
    /// closes the subscription.
    async fn subscribe(&self, request_id: &str) -> Result<BoxStream<'static, Result<ServerEvent>>>;

    /// Fetch the recent history of a persisted session
    /// (POST /student/get-recent-messages).
    async fn recent_messages(&self, session_id: &str) -> Result<Vec<Message>>;

    /// Persist a finalized assistant response (POST /student/save-response).
    async fn save_response(&self, session_id: &str, response: &str) -> Result<()>;

    /// Purge the server-side session record (POST /student/clear-chat-history).
    async fn clear_history(&self, session_id: &str) -> Result<()>;
}

/// Abstraction over the progress-tracking endpoints.
#[async_trait]
pub trait ProgressBackend: Send + Sync {
    /// POST /student/rate-topic.
    async fn rate_topic(&self, req: RateTopicRequest) -> Result<()>;

    /// POST /student/record-exam.
    async fn record_exam(&self, req: RecordExamRequest) -> Result<()>;

    /// POST /student/track-activity.
    async fn track_activity(&self, req: TrackActivityRequest) -> Result<StreakUpdate>;

    /// GET /student/get-activity-data.
    async fn activity_data(&self) -> Result<ActivityData>;

    /// GET /student/get-topic-progress.
    async fn topic_progress(&self) -> Result<Vec<TopicProgress>>;

    /// POST /student/mark-topic-reviewed.
    async fn mark_topic_reviewed(&self, topic_code: &str) -> Result<()>;

    /// POST /student/generate-exam-pdf.  Returns the PDF URL.
    async fn generate_exam_pdf(&self, req: ExamPdfRequest) -> Result<String>;
}
