//! A scripted in-memory `TutorBackend` that records every call.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use tutor_backend::{AcceptResponse, ChatRequest, InitialPromptRequest, TutorBackend};
use tutor_chat::{MessageList, SessionController};
use tutor_domain::config::ChatConfig;
use tutor_domain::{BoxStream, Error, Message, Result, ServerEvent, Topic};
use tutor_sessions::LocalStore;

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Initial(InitialPromptRequest),
    Chat(ChatRequest),
    Subscribe(String),
    Recent(String),
    Save { session_id: String, response: String },
    Clear(String),
}

/// A scripted stream item; `Err` becomes a transport error.
pub type Step = std::result::Result<ServerEvent, String>;

pub struct ScriptedBackend {
    calls: Mutex<Vec<Call>>,
    accepts: Mutex<VecDeque<std::result::Result<AcceptResponse, String>>>,
    streams: Mutex<VecDeque<Vec<Step>>>,
    keyed_streams: Mutex<HashMap<String, Vec<Step>>>,
    recent: Mutex<std::result::Result<Vec<Message>, String>>,
    save_fails: Mutex<bool>,
}

impl Default for ScriptedBackend {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            accepts: Mutex::new(VecDeque::new()),
            streams: Mutex::new(VecDeque::new()),
            keyed_streams: Mutex::new(HashMap::new()),
            recent: Mutex::new(Ok(Vec::new())),
            save_fails: Mutex::new(false),
        }
    }
}

impl ScriptedBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue the response to the next initial-prompt or chat POST.
    pub fn accept(&self, response: AcceptResponse) -> &Self {
        self.accepts.lock().push_back(Ok(response));
        self
    }

    pub fn accept_with_session(&self, session_id: &str) -> &Self {
        self.accept(AcceptResponse {
            success: Some(true),
            error: None,
            session_id: Some(session_id.to_owned()),
        })
    }

    /// Make the next POST fail at the transport level.
    pub fn fail_post(&self, message: &str) -> &Self {
        self.accepts.lock().push_back(Err(message.to_owned()));
        self
    }

    /// Queue the events for the next subscription.
    pub fn stream(&self, steps: Vec<Step>) -> &Self {
        self.streams.lock().push_back(steps);
        self
    }

    /// Events for the subscription with a specific request ID.
    pub fn stream_for(&self, request_id: &str, steps: Vec<Step>) -> &Self {
        self.keyed_streams
            .lock()
            .insert(request_id.to_owned(), steps);
        self
    }

    pub fn recent(&self, result: std::result::Result<Vec<Message>, String>) -> &Self {
        *self.recent.lock() = result;
        self
    }

    pub fn failing_saves(&self) -> &Self {
        *self.save_fails.lock() = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    fn record(&self, call: Call) {
        self.calls.lock().push(call);
    }

    fn next_accept(&self) -> Result<AcceptResponse> {
        match self.accepts.lock().pop_front() {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(Error::Http(message)),
            None => Ok(AcceptResponse {
                success: Some(true),
                ..AcceptResponse::default()
            }),
        }
    }
}

/// `Connected`, `text` fragments, then `Done` with no final text.
pub fn reply(fragments: &[&str]) -> Vec<Step> {
    std::iter::once(Ok(ServerEvent::Connected))
        .chain(fragments.iter().map(|f| Ok(ServerEvent::text(*f))))
        .chain(std::iter::once(Ok(ServerEvent::done(None))))
        .collect()
}

#[async_trait]
impl TutorBackend for ScriptedBackend {
    async fn initial_prompt(&self, req: InitialPromptRequest) -> Result<AcceptResponse> {
        self.record(Call::Initial(req));
        self.next_accept()
    }

    async fn chat(&self, req: ChatRequest) -> Result<AcceptResponse> {
        self.record(Call::Chat(req));
        self.next_accept()
    }

    async fn subscribe(&self, request_id: &str) -> Result<BoxStream<'static, Result<ServerEvent>>> {
        self.record(Call::Subscribe(request_id.to_owned()));
        let steps = self
            .keyed_streams
            .lock()
            .remove(request_id)
            .or_else(|| self.streams.lock().pop_front())
            .unwrap_or_else(|| reply(&["Reply"]));

        let stream = async_stream::stream! {
            for step in steps {
                tokio::task::yield_now().await;
                yield step.map_err(Error::Stream);
            }
        };
        Ok(Box::pin(stream))
    }

    async fn recent_messages(&self, session_id: &str) -> Result<Vec<Message>> {
        self.record(Call::Recent(session_id.to_owned()));
        self.recent.lock().clone().map_err(Error::Http)
    }

    async fn save_response(&self, session_id: &str, response: &str) -> Result<()> {
        self.record(Call::Save {
            session_id: session_id.to_owned(),
            response: response.to_owned(),
        });
        if *self.save_fails.lock() {
            return Err(Error::Http("save failed".into()));
        }
        Ok(())
    }

    async fn clear_history(&self, session_id: &str) -> Result<()> {
        self.record(Call::Clear(session_id.to_owned()));
        Ok(())
    }
}

pub fn topic() -> Topic {
    Topic::new("1.1.1", "Structure and function of the processor")
}

pub struct Harness {
    pub backend: Arc<ScriptedBackend>,
    pub store: Arc<LocalStore>,
    pub view: Arc<MessageList>,
    pub controller: SessionController,
}

impl Harness {
    pub fn new(backend: Arc<ScriptedBackend>, store: Arc<LocalStore>) -> Self {
        Self::with_config(backend, store, ChatConfig::default())
    }

    pub fn with_config(backend: Arc<ScriptedBackend>, store: Arc<LocalStore>, config: ChatConfig) -> Self {
        let view = Arc::new(MessageList::new());
        let controller = SessionController::new(
            topic(),
            config,
            backend.clone(),
            store.clone(),
            view.clone(),
        );
        Self {
            backend,
            store,
            view,
            controller,
        }
    }
}
