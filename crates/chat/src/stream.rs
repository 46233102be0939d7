//! One generation turn: POST, subscribe, accumulate, finalize.
//!
//! ```text
//! Idle ──POST──▶ Requesting ──accepted──▶ Streaming ──done──▶ Done
//!                    │                        │
//!                    └──rejected / error──▶ Failed ◀──error, nothing received
//! ```
//!
//! A transport error after some text has arrived is a soft completion:
//! the partial text is kept as the final answer.

use std::time::Instant;

use futures_util::StreamExt;
use tutor_backend::{AcceptResponse, ChatRequest, InitialPromptRequest, TutorBackend};
use tutor_domain::error::{Error, Result};
use tutor_domain::trace::TraceEvent;
use tutor_domain::{Mode, ServerEvent};

use crate::view::{ChatView, MessageId, Rendered};

const ENDPOINT_INITIAL: &str = "POST /student/initial-prompt";
const ENDPOINT_CHAT: &str = "POST /student/chat";

/// The POST that starts a turn.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnRequest {
    Initial(InitialPromptRequest),
    Chat(ChatRequest),
}

impl TurnRequest {
    pub fn request_id(&self) -> &str {
        match self {
            TurnRequest::Initial(r) => &r.request_id,
            TurnRequest::Chat(r) => &r.request_id,
        }
    }

    pub fn topic_code(&self) -> &str {
        match self {
            TurnRequest::Initial(r) => &r.topic_code,
            TurnRequest::Chat(r) => &r.topic_code,
        }
    }

    pub fn mode(&self) -> Mode {
        match self {
            TurnRequest::Initial(r) => r.mode,
            TurnRequest::Chat(r) => r.mode,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            TurnRequest::Initial(_) => "initial",
            TurnRequest::Chat(_) => "chat",
        }
    }

    fn endpoint(&self) -> &'static str {
        match self {
            TurnRequest::Initial(_) => ENDPOINT_INITIAL,
            TurnRequest::Chat(_) => ENDPOINT_CHAT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    Idle,
    Requesting,
    Streaming,
    Done,
    Failed,
}

/// How a turn ended.
#[derive(Debug)]
pub enum TurnOutcome {
    /// The final assistant text.  `partial` is set when the stream broke
    /// after some text had arrived and that text was kept.
    Completed {
        text: String,
        session_id: Option<String>,
        partial: bool,
    },
    /// Nothing usable was produced.  `session_id` is still reported if the
    /// backend assigned one before the failure.
    Failed {
        error: Error,
        session_id: Option<String>,
    },
}

impl TurnOutcome {
    pub fn session_id(&self) -> Option<&str> {
        match self {
            TurnOutcome::Completed { session_id, .. } | TurnOutcome::Failed { session_id, .. } => {
                session_id.as_deref()
            }
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            TurnOutcome::Completed { text, .. } => Some(text),
            TurnOutcome::Failed { .. } => None,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, TurnOutcome::Completed { .. })
    }
}

/// Drives a single turn against a backend and a view.
///
/// Each consumer owns its request ID and its placeholder, so several may
/// run at once without writing into each other's messages.
pub struct StreamConsumer<'a> {
    backend: &'a dyn TutorBackend,
    view: &'a dyn ChatView,
    thinking_text: &'a str,
    state: TurnState,
    placeholder: Option<MessageId>,
}

impl<'a> StreamConsumer<'a> {
    pub fn new(backend: &'a dyn TutorBackend, view: &'a dyn ChatView, thinking_text: &'a str) -> Self {
        Self {
            backend,
            view,
            thinking_text,
            state: TurnState::Idle,
            placeholder: None,
        }
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    pub async fn run(&mut self, request: TurnRequest) -> TurnOutcome {
        let started = Instant::now();
        let request_id = request.request_id().to_owned();

        TraceEvent::TurnStarted {
            request_id: request_id.clone(),
            kind: request.kind().into(),
            topic_code: request.topic_code().into(),
            mode: request.mode().to_string(),
        }
        .emit();

        let outcome = self.drive(request).await;

        let (label, chars) = match &outcome {
            TurnOutcome::Completed { text, partial, .. } => {
                (if *partial { "partial" } else { "done" }, text.chars().count())
            }
            TurnOutcome::Failed { .. } => ("failed", 0),
        };
        TraceEvent::TurnFinished {
            request_id,
            outcome: label.into(),
            chars,
            duration_ms: started.elapsed().as_millis() as u64,
        }
        .emit();

        outcome
    }

    async fn drive(&mut self, request: TurnRequest) -> TurnOutcome {
        let request_id = request.request_id().to_owned();
        let endpoint = request.endpoint();

        self.state = TurnState::Requesting;
        self.placeholder = Some(
            self.view
                .begin_pending(&request_id, Rendered::system(self.thinking_text)),
        );

        let accepted = match self.post(request).await {
            Ok(accepted) => accepted,
            Err(e) => {
                tracing::warn!(request_id = %request_id, endpoint, error = %e, "turn rejected");
                return self.fail(e, None);
            }
        };
        let session_id = accepted.session_id;

        let mut events = match self.backend.subscribe(&request_id).await {
            Ok(events) => events,
            Err(e) => {
                tracing::warn!(request_id = %request_id, error = %e, "subscribe failed");
                return self.fail(e, session_id);
            }
        };
        self.state = TurnState::Streaming;

        let mut accumulated = String::new();
        let mut transport_error = None;
        let mut final_text = None;

        while let Some(event) = events.next().await {
            match event {
                Ok(ServerEvent::Connected) => {
                    tracing::debug!(request_id = %request_id, "stream connected");
                }
                Ok(ServerEvent::Text { text }) => {
                    accumulated.push_str(&text);
                    if let Some(id) = self.placeholder {
                        self.view.update(id, Rendered::assistant(accumulated.as_str()));
                    }
                }
                Ok(ServerEvent::Done { full_response }) => {
                    final_text = Some(match full_response {
                        Some(full) if !full.is_empty() => full,
                        _ => std::mem::take(&mut accumulated),
                    });
                    break;
                }
                Err(e) => {
                    transport_error = Some(e);
                    break;
                }
            }
        }
        drop(events);

        match (final_text, transport_error) {
            (Some(text), _) if !text.is_empty() => self.complete(text, session_id, false),
            (Some(_), _) => self.fail(Error::Stream("empty response".into()), session_id),
            (None, Some(e)) if !accumulated.is_empty() => {
                tracing::warn!(
                    request_id = %request_id,
                    error = %e,
                    chars = accumulated.len(),
                    "stream broke after partial text; keeping it"
                );
                self.complete(accumulated, session_id, true)
            }
            (None, Some(e)) => self.fail(e, session_id),
            (None, None) => self.fail(
                Error::Stream("event stream closed before done".into()),
                session_id,
            ),
        }
    }

    async fn post(&self, request: TurnRequest) -> Result<AcceptResponse> {
        let endpoint = request.endpoint();
        let response = match request {
            TurnRequest::Initial(req) => self.backend.initial_prompt(req).await?,
            TurnRequest::Chat(req) => self.backend.chat(req).await?,
        };
        response.into_result(endpoint)
    }

    fn complete(&mut self, text: String, session_id: Option<String>, partial: bool) -> TurnOutcome {
        if let Some(id) = self.placeholder.take() {
            self.view.finish(id, Rendered::assistant(text.as_str()));
        }
        self.state = TurnState::Done;
        TurnOutcome::Completed {
            text,
            session_id,
            partial,
        }
    }

    fn fail(&mut self, error: Error, session_id: Option<String>) -> TurnOutcome {
        if let Some(id) = self.placeholder.take() {
            self.view.remove(id);
        }
        self.view.append(Rendered::system(user_facing_error(&error)));
        self.state = TurnState::Failed;
        TurnOutcome::Failed { error, session_id }
    }
}

/// The system message shown in place of a failed turn.
pub fn user_facing_error(error: &Error) -> String {
    match error {
        Error::Backend { message, .. } => format!("Error: {message}"),
        Error::Stream(_) => "The response was interrupted. Please try sending your message again."
            .to_owned(),
        _ => "Sorry, I couldn't reach the tutor right now. Please try again.".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use async_trait::async_trait;
    use parking_lot::Mutex;
    use tutor_domain::{BoxStream, Message, Role};

    use super::*;
    use crate::view::MessageList;

    /// Accepts every POST and replays one scripted stream.
    struct OneShot {
        accept: Mutex<Option<Result<AcceptResponse>>>,
        events: Mutex<VecDeque<Result<ServerEvent>>>,
        subscribed: Mutex<Vec<String>>,
    }

    impl OneShot {
        fn new(accept: Result<AcceptResponse>, events: Vec<Result<ServerEvent>>) -> Self {
            Self {
                accept: Mutex::new(Some(accept)),
                events: Mutex::new(events.into()),
                subscribed: Mutex::new(Vec::new()),
            }
        }

        fn take_accept(&self) -> Result<AcceptResponse> {
            self.accept.lock().take().unwrap_or_else(|| Ok(AcceptResponse::default()))
        }
    }

    #[async_trait]
    impl TutorBackend for OneShot {
        async fn initial_prompt(&self, _req: InitialPromptRequest) -> Result<AcceptResponse> {
            self.take_accept()
        }
        async fn chat(&self, _req: ChatRequest) -> Result<AcceptResponse> {
            self.take_accept()
        }
        async fn subscribe(&self, request_id: &str) -> Result<BoxStream<'static, Result<ServerEvent>>> {
            self.subscribed.lock().push(request_id.to_owned());
            let events: Vec<_> = self.events.lock().drain(..).collect();
            Ok(Box::pin(futures_util::stream::iter(events)))
        }
        async fn recent_messages(&self, _session_id: &str) -> Result<Vec<Message>> {
            Ok(Vec::new())
        }
        async fn save_response(&self, _session_id: &str, _response: &str) -> Result<()> {
            Ok(())
        }
        async fn clear_history(&self, _session_id: &str) -> Result<()> {
            Ok(())
        }
    }

    fn chat(id: &str) -> TurnRequest {
        TurnRequest::Chat(ChatRequest {
            question: "q".into(),
            topic_code: "1.1.1".into(),
            mode: Mode::Explore,
            stream: true,
            request_id: id.into(),
            session_id: None,
            history: Vec::new(),
        })
    }

    #[tokio::test]
    async fn done_full_response_overrides_fragments() {
        let backend = OneShot::new(
            Ok(AcceptResponse::default()),
            vec![
                Ok(ServerEvent::Connected),
                Ok(ServerEvent::text("Hel")),
                Ok(ServerEvent::text("lo wor")),
                Ok(ServerEvent::text("ld!!")),
                Ok(ServerEvent::done(Some("Hello world"))),
            ],
        );
        let view = MessageList::new();
        let mut consumer = StreamConsumer::new(&backend, &view, "Thinking...");

        let outcome = consumer.run(chat("req_1")).await;
        assert_eq!(outcome.text(), Some("Hello world"));
        assert_eq!(consumer.state(), TurnState::Done);

        let entries = view.snapshot();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].rendered.role, Role::Assistant);
        assert_eq!(entries[0].rendered.text, "Hello world");
        assert!(!entries[0].pending);
        assert_eq!(backend.subscribed.lock().as_slice(), ["req_1"]);
    }

    #[tokio::test]
    async fn done_without_full_response_keeps_accumulator() {
        let backend = OneShot::new(
            Ok(AcceptResponse::default()),
            vec![
                Ok(ServerEvent::text("Hel")),
                Ok(ServerEvent::text("lo")),
                Ok(ServerEvent::done(None)),
            ],
        );
        let view = MessageList::new();
        let outcome = StreamConsumer::new(&backend, &view, "…").run(chat("req_2")).await;
        assert_eq!(outcome.text(), Some("Hello"));
    }

    #[tokio::test]
    async fn rejection_removes_placeholder_and_never_subscribes() {
        let backend = OneShot::new(
            Ok(AcceptResponse {
                success: Some(false),
                error: Some("quota exceeded".into()),
                session_id: None,
            }),
            vec![Ok(ServerEvent::text("unused"))],
        );
        let view = MessageList::new();
        let mut consumer = StreamConsumer::new(&backend, &view, "Thinking...");
        let outcome = consumer.run(chat("req_3")).await;

        assert!(!outcome.is_completed());
        assert_eq!(consumer.state(), TurnState::Failed);
        assert!(backend.subscribed.lock().is_empty());
        assert_eq!(
            view.texts(),
            vec![(Role::System, "Error: quota exceeded".to_owned())]
        );
    }

    #[tokio::test]
    async fn transport_error_with_text_is_soft_completion() {
        let backend = OneShot::new(
            Ok(AcceptResponse::default()),
            vec![
                Ok(ServerEvent::text("partial answer")),
                Err(Error::Stream("reset".into())),
            ],
        );
        let view = MessageList::new();
        let outcome = StreamConsumer::new(&backend, &view, "…").run(chat("req_4")).await;
        match outcome {
            TurnOutcome::Completed { text, partial, .. } => {
                assert_eq!(text, "partial answer");
                assert!(partial);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(view.pending_count(), 0);
    }

    #[tokio::test]
    async fn transport_error_without_text_fails() {
        let backend = OneShot::new(
            Ok(AcceptResponse {
                session_id: Some("sess_9".into()),
                ..AcceptResponse::default()
            }),
            vec![Ok(ServerEvent::Connected), Err(Error::Stream("reset".into()))],
        );
        let view = MessageList::new();
        let outcome = StreamConsumer::new(&backend, &view, "…").run(chat("req_5")).await;
        assert!(!outcome.is_completed());
        assert_eq!(outcome.session_id(), Some("sess_9"));
        let texts = view.texts();
        assert_eq!(texts.len(), 1);
        assert_eq!(texts[0].0, Role::System);
    }

    #[test]
    fn backend_errors_are_shown_verbatim() {
        let e = Error::backend(ENDPOINT_CHAT, "topic not found");
        assert_eq!(user_facing_error(&e), "Error: topic not found");
        assert!(user_facing_error(&Error::Http("x".into())).contains("try again"));
    }
}
