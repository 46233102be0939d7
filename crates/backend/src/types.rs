//! Data Transfer Objects matching the tutoring backend's JSON contracts.
//!
//! The chat endpoints use `camelCase` on the wire; the progress endpoints
//! use `snake_case` request bodies, matching what the backend reads.

use serde::{Deserialize, Serialize};
use tutor_domain::error::{Error, Result};
use tutor_domain::{Message, Mode};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Generation requests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// POST /student/initial-prompt: request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitialPromptRequest {
    pub topic_code: String,
    pub topic_title: String,
    pub mode: Mode,
    /// The templated opener, context tag included.
    pub prompt: String,
    pub stream: bool,
    pub request_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// POST /student/chat: request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub question: String,
    pub topic_code: String,
    pub mode: Mode,
    pub stream: bool,
    pub request_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Conversation so far, excluding `question`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<Message>,
}

/// Response to a generation request.  Acceptance is signalled either by
/// `success: true` or simply by the absence of `error`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub error: Option<String>,
    /// Assigned by the backend the first time a session is created.
    #[serde(default, alias = "session_id")]
    pub session_id: Option<String>,
}

impl AcceptResponse {
    pub fn accepted(&self) -> bool {
        self.error.is_none() && self.success != Some(false)
    }

    /// Turn a rejected body into [`Error::Backend`].
    pub fn into_result(self, endpoint: &str) -> Result<Self> {
        if let Some(message) = self.error {
            return Err(Error::backend(endpoint, message));
        }
        if self.success == Some(false) {
            return Err(Error::backend(endpoint, "request was not accepted"));
        }
        Ok(self)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Session persistence
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Body for the endpoints keyed only by session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRef {
    pub session_id: String,
}

/// POST /student/get-recent-messages: response body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecentMessagesResponse {
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub error: Option<String>,
}

/// POST /student/save-response: request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveResponseRequest {
    pub session_id: String,
    pub response: String,
}

/// Generic acknowledgement body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub error: Option<String>,
}

impl Ack {
    pub fn into_result(self, endpoint: &str) -> Result<()> {
        match (self.error, self.success) {
            (Some(message), _) => Err(Error::backend(endpoint, message)),
            (None, Some(false)) => Err(Error::backend(endpoint, "request failed")),
            _ => Ok(()),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Progress widgets
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// POST /student/rate-topic: request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateTopicRequest {
    pub topic_code: String,
    pub topic_title: String,
    pub rating: u8,
    #[serde(default)]
    pub notes: String,
}

/// POST /student/record-exam: request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordExamRequest {
    pub topic_code: String,
    pub question_type: String,
    pub difficulty: u8,
    pub score: u32,
    pub max_score: u32,
}

/// POST /student/track-activity: request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackActivityRequest {
    pub activity_type: String,
    pub session_duration: u64,
}

impl TrackActivityRequest {
    pub fn page_view() -> Self {
        Self {
            activity_type: "page_view".into(),
            session_duration: 0,
        }
    }
}

/// POST /student/track-activity: response body.  Either field may be
/// absent when the backend has nothing new to report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakUpdate {
    #[serde(default)]
    pub streak: Option<u32>,
    #[serde(default, alias = "streak_at_risk")]
    pub streak_at_risk: Option<bool>,
    #[serde(default)]
    pub error: Option<String>,
}

/// GET /student/get-activity-data: response body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityData {
    #[serde(default)]
    pub activity_data: Vec<ActivityDay>,
    #[serde(default)]
    pub current_streak: u32,
    #[serde(default)]
    pub streak_at_risk: bool,
}

/// One day of recorded activity.  `date` is `YYYY-MM-DD`; `level` is 0–4.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityDay {
    pub date: String,
    #[serde(default)]
    pub level: u8,
}

/// GET /student/get-topic-progress: one entry of the response array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicProgress {
    pub topic_code: String,
    pub topic_title: String,
    #[serde(default)]
    pub proficiency: u8,
    /// ISO date or RFC 3339 timestamp; absent for never-studied topics.
    #[serde(default)]
    pub last_studied: Option<String>,
}

/// POST /student/mark-topic-reviewed: request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkReviewedRequest {
    pub topic_code: String,
}

/// POST /student/generate-exam-pdf: request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamPdfRequest {
    pub topic_title: String,
    pub content: String,
    pub topic_code: String,
}

/// POST /student/generate-exam-pdf: response body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamPdfResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default, alias = "pdf_url")]
    pub pdf_url: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}
