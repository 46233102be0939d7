//! REST implementation of [`TutorBackend`] and [`ProgressBackend`].
//!
//! `RestBackend` wraps two `reqwest::Client`s: one with a request timeout
//! for ordinary JSON calls, and one without (the event stream can stay
//! open for as long as generation takes; idleness is bounded per chunk
//! instead).  Calls are never retried.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tutor_domain::config::BackendConfig;
use tutor_domain::error::{Error, Result};
use tutor_domain::trace::TraceEvent;
use tutor_domain::{BoxStream, Message, ServerEvent};
use uuid::Uuid;

use crate::provider::{ProgressBackend, TutorBackend};
use crate::sse::sse_event_stream;
use crate::types::{
    AcceptResponse, Ack, ActivityData, ChatRequest, ExamPdfRequest, ExamPdfResponse,
    InitialPromptRequest, MarkReviewedRequest, RateTopicRequest, RecentMessagesResponse,
    RecordExamRequest, SaveResponseRequest, SessionRef, StreakUpdate, TopicProgress,
    TrackActivityRequest,
};

const INITIAL_PROMPT: &str = "/student/initial-prompt";
const CHAT: &str = "/student/chat";
const CHAT_STREAM: &str = "/student/chat-stream";
const RECENT_MESSAGES: &str = "/student/get-recent-messages";
const SAVE_RESPONSE: &str = "/student/save-response";
const CLEAR_HISTORY: &str = "/student/clear-chat-history";
const RATE_TOPIC: &str = "/student/rate-topic";
const RECORD_EXAM: &str = "/student/record-exam";
const TRACK_ACTIVITY: &str = "/student/track-activity";
const ACTIVITY_DATA: &str = "/student/get-activity-data";
const TOPIC_PROGRESS: &str = "/student/get-topic-progress";
const MARK_REVIEWED: &str = "/student/mark-topic-reviewed";
const EXAM_PDF: &str = "/student/generate-exam-pdf";

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Client
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A REST-based client for the tutoring backend.
///
/// Created once per page (process) and reused; the underlying
/// `reqwest::Client`s maintain connection pools.
#[derive(Debug, Clone)]
pub struct RestBackend {
    http: Client,
    stream_http: Client,
    base_url: String,
    api_token: Option<String>,
    stream_idle_timeout: Duration,
}

impl RestBackend {
    /// Build a new client from the shared `BackendConfig`.
    ///
    /// The bearer token, if any, is read from the environment variable
    /// named by `api_token_env`.
    pub fn new(cfg: &BackendConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_millis(cfg.timeout_ms))
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;
        let stream_http = Client::builder()
            .connect_timeout(Duration::from_millis(cfg.timeout_ms))
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;

        let api_token = std::env::var(&cfg.api_token_env)
            .ok()
            .filter(|t| !t.trim().is_empty());

        Ok(Self {
            http,
            stream_http,
            base_url: cfg.base_url.trim_end_matches('/').to_owned(),
            api_token,
            stream_idle_timeout: Duration::from_millis(cfg.stream_idle_timeout_ms),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ── request helpers ──────────────────────────────────────────────

    /// Decorate a `RequestBuilder` with the standard client headers.
    fn decorate(&self, rb: RequestBuilder) -> RequestBuilder {
        let trace_id = Uuid::new_v4().to_string();
        let rb = rb
            .header("X-Client-Type", "tutor-client")
            .header("X-Trace-Id", &trace_id);

        match self.api_token {
            Some(ref token) => rb.bearer_auth(token),
            None => rb,
        }
    }

    /// Build the full URL for a path like `/student/chat`.
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send one request, emit a `BackendCall` trace event, and map
    /// non-2xx statuses to errors.
    async fn execute(&self, endpoint: &str, rb: RequestBuilder) -> Result<Response> {
        let start = Instant::now();
        let result = self.decorate(rb).send().await;
        let duration_ms = start.elapsed().as_millis() as u64;

        let resp = match result {
            Ok(resp) => resp,
            Err(e) => {
                TraceEvent::BackendCall {
                    endpoint: endpoint.to_owned(),
                    status: e.status().map(|s| s.as_u16()).unwrap_or(0),
                    duration_ms,
                }
                .emit();
                return Err(from_reqwest(e));
            }
        };

        let status = resp.status();
        TraceEvent::BackendCall {
            endpoint: endpoint.to_owned(),
            status: status.as_u16(),
            duration_ms,
        }
        .emit();

        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().await.unwrap_or_default();
        let detail = error_field(&body).unwrap_or(body);
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(Error::Auth(format!(
                "{endpoint} auth failed ({status}): {detail}"
            )));
        }
        Err(Error::Http(format!("{endpoint} returned {status}: {detail}")))
    }

    /// POST a JSON body and decode a JSON response.
    async fn post_json<Req, Resp>(&self, path: &str, body: &Req) -> Result<Resp>
    where
        Req: serde::Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let endpoint = format!("POST {path}");
        let resp = self
            .execute(&endpoint, self.http.post(self.url(path)).json(body))
            .await?;
        decode(&endpoint, resp).await
    }

    /// GET and decode a JSON response.
    async fn get_json<Resp: DeserializeOwned>(&self, path: &str) -> Result<Resp> {
        let endpoint = format!("GET {path}");
        let resp = self.execute(&endpoint, self.http.get(self.url(path))).await?;
        decode(&endpoint, resp).await
    }
}

async fn decode<Resp: DeserializeOwned>(endpoint: &str, resp: Response) -> Result<Resp> {
    let body = resp.text().await.map_err(from_reqwest)?;
    serde_json::from_str(&body).map_err(|e| {
        Error::Other(format!("failed to parse {endpoint} response: {e}: {body}"))
    })
}

/// Pull an `"error"` string out of a JSON error body, if there is one.
fn error_field(body: &str) -> Option<String> {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()?
        .get("error")?
        .as_str()
        .map(str::to_owned)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Trait implementations
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[async_trait]
impl TutorBackend for RestBackend {
    async fn initial_prompt(&self, req: InitialPromptRequest) -> Result<AcceptResponse> {
        self.post_json(INITIAL_PROMPT, &req).await
    }

    async fn chat(&self, req: ChatRequest) -> Result<AcceptResponse> {
        self.post_json(CHAT, &req).await
    }

    async fn subscribe(&self, request_id: &str) -> Result<BoxStream<'static, Result<ServerEvent>>> {
        let endpoint = format!("GET {CHAT_STREAM}");
        let rb = self
            .stream_http
            .get(self.url(CHAT_STREAM))
            .query(&[("requestId", request_id)])
            .header("Accept", "text/event-stream");
        let resp = self.execute(&endpoint, rb).await?;

        let chunks = resp.bytes_stream().map(|chunk| chunk.map_err(from_reqwest));
        Ok(sse_event_stream(chunks, self.stream_idle_timeout))
    }

    async fn recent_messages(&self, session_id: &str) -> Result<Vec<Message>> {
        let body = SessionRef {
            session_id: session_id.to_owned(),
        };
        let resp: RecentMessagesResponse = self.post_json(RECENT_MESSAGES, &body).await?;
        match resp.error {
            Some(message) => Err(Error::backend(RECENT_MESSAGES, message)),
            None => Ok(resp.messages),
        }
    }

    async fn save_response(&self, session_id: &str, response: &str) -> Result<()> {
        let body = SaveResponseRequest {
            session_id: session_id.to_owned(),
            response: response.to_owned(),
        };
        let ack: Ack = self.post_json(SAVE_RESPONSE, &body).await?;
        ack.into_result(SAVE_RESPONSE)
    }

    async fn clear_history(&self, session_id: &str) -> Result<()> {
        let body = SessionRef {
            session_id: session_id.to_owned(),
        };
        let ack: Ack = self.post_json(CLEAR_HISTORY, &body).await?;
        ack.into_result(CLEAR_HISTORY)
    }
}

#[async_trait]
impl ProgressBackend for RestBackend {
    async fn rate_topic(&self, req: RateTopicRequest) -> Result<()> {
        let ack: Ack = self.post_json(RATE_TOPIC, &req).await?;
        ack.into_result(RATE_TOPIC)
    }

    async fn record_exam(&self, req: RecordExamRequest) -> Result<()> {
        let ack: Ack = self.post_json(RECORD_EXAM, &req).await?;
        ack.into_result(RECORD_EXAM)
    }

    async fn track_activity(&self, req: TrackActivityRequest) -> Result<StreakUpdate> {
        let update: StreakUpdate = self.post_json(TRACK_ACTIVITY, &req).await?;
        match update.error {
            Some(message) => Err(Error::backend(TRACK_ACTIVITY, message)),
            None => Ok(update),
        }
    }

    async fn activity_data(&self) -> Result<ActivityData> {
        self.get_json(ACTIVITY_DATA).await
    }

    async fn topic_progress(&self) -> Result<Vec<TopicProgress>> {
        self.get_json(TOPIC_PROGRESS).await
    }

    async fn mark_topic_reviewed(&self, topic_code: &str) -> Result<()> {
        let body = MarkReviewedRequest {
            topic_code: topic_code.to_owned(),
        };
        let ack: Ack = self.post_json(MARK_REVIEWED, &body).await?;
        ack.into_result(MARK_REVIEWED)
    }

    async fn generate_exam_pdf(&self, req: ExamPdfRequest) -> Result<String> {
        let resp: ExamPdfResponse = self.post_json(EXAM_PDF, &req).await?;
        if let Some(message) = resp.error {
            return Err(Error::backend(EXAM_PDF, message));
        }
        resp.pdf_url
            .filter(|_| resp.success != Some(false))
            .ok_or_else(|| Error::backend(EXAM_PDF, "no PDF URL in response"))
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Error conversion helper
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Convert a `reqwest::Error` into a domain `Error`.
///
/// Timeout errors become `Error::Timeout`; everything else becomes
/// `Error::Http`.
pub fn from_reqwest(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout(e.to_string())
    } else {
        Error::Http(e.to_string())
    }
}
