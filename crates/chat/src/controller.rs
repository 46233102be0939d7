//! The per-topic session controller.
//!
//! Owns the conversation state that the page used to keep in globals
//! (mode, session ID, history) and exposes the intents the view layer
//! calls.  Methods take `&mut self`: one controller is driven from one
//! task, so turns on it are sequential.

use std::sync::Arc;

use tokio::task::JoinSet;
use tutor_backend::{ChatRequest, InitialPromptRequest, ProgressBackend, RateTopicRequest, RecordExamRequest, TutorBackend};
use tutor_domain::config::ChatConfig;
use tutor_domain::error::Result;
use tutor_domain::trace::TraceEvent;
use tutor_domain::{Message, Mode, Topic};
use tutor_progress::{forms, EXAM_RECORDED, RATING_SAVED};
use tutor_sessions::{HistoryStore, LocalStore};

use crate::prompt::{self, local_time_string, OutboundPrompt};
use crate::request_id::next_request_id;
use crate::resolver::{self, FreshReason, Resolution};
use crate::stream::{StreamConsumer, TurnOutcome, TurnRequest};
use crate::view::{ChatView, Rendered};

/// Notice shown when a stored session could not be loaded.
pub const RESUME_FAILED_NOTICE: &str =
    "Couldn't load your previous conversation, so a new one has been started.";

pub struct SessionController {
    topic: Topic,
    mode: Mode,
    session_id: Option<String>,
    history: HistoryStore,
    config: ChatConfig,
    backend: Arc<dyn TutorBackend>,
    store: Arc<LocalStore>,
    view: Arc<dyn ChatView>,
    /// Fire-and-forget persistence calls.
    background: JoinSet<()>,
}

impl SessionController {
    pub fn new(
        topic: Topic,
        config: ChatConfig,
        backend: Arc<dyn TutorBackend>,
        store: Arc<LocalStore>,
        view: Arc<dyn ChatView>,
    ) -> Self {
        Self {
            topic,
            mode: config.default_mode,
            session_id: None,
            history: HistoryStore::new(),
            config,
            backend,
            store,
            view,
            background: JoinSet::new(),
        }
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Intents
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Resume the stored session for this topic or start a new one.
    ///
    /// Returns the outcome of the turn this triggered, if any.  A resumed
    /// session whose last message is from the user gets an automatic
    /// reply; any other resumed session waits for input.
    pub async fn start(&mut self) -> Option<TurnOutcome> {
        match resolver::resolve(&self.store, self.backend.as_ref(), &self.topic.code).await {
            Resolution::Resumed {
                session_id,
                messages,
            } => {
                TraceEvent::SessionResolved {
                    topic_code: self.topic.code.clone(),
                    session_id: Some(session_id.clone()),
                    resumed: true,
                    messages: messages.len(),
                }
                .emit();

                self.session_id = Some(session_id);
                self.history.replace(messages);
                self.history.trim(self.config.max_history);
                for message in resolver::visible_history(self.history.messages()) {
                    self.view.append(Rendered::new(message.role, message.content));
                }

                let pending = self.history.trailing_user().map(|m| m.content.clone())?;
                tracing::info!(topic_code = %self.topic.code, "resumed session ends on a user turn; requesting reply");
                let request = self.chat_request(pending);
                Some(self.run_turn(request).await)
            }
            Resolution::Fresh { reason } => {
                if let FreshReason::FetchFailed(_) = &reason {
                    self.view.notify(RESUME_FAILED_NOTICE);
                }
                tracing::info!(topic_code = %self.topic.code, reason = ?reason, "starting fresh session");
                TraceEvent::SessionResolved {
                    topic_code: self.topic.code.clone(),
                    session_id: None,
                    resumed: false,
                    messages: 0,
                }
                .emit();
                Some(self.send_initial_prompt().await)
            }
        }
    }

    /// Start the conversation over with the templated opener for the
    /// current mode.  The opener is never displayed.
    pub async fn send_initial_prompt(&mut self) -> TurnOutcome {
        self.history.reset();
        let OutboundPrompt { outbound, .. } =
            prompt::initial_prompt(&self.topic, self.mode, &local_time_string());
        self.history.append(Message::user(outbound.as_str()));

        let request = TurnRequest::Initial(InitialPromptRequest {
            topic_code: self.topic.code.clone(),
            topic_title: self.topic.title.clone(),
            mode: self.mode,
            prompt: outbound,
            stream: true,
            request_id: next_request_id(),
            session_id: self.session_id.clone(),
        });
        self.run_turn(request).await
    }

    /// Send a user-typed question.  Blank input is ignored.
    pub async fn send_message(&mut self, text: &str) -> Option<TurnOutcome> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        let OutboundPrompt { outbound, display } =
            prompt::follow_up(&self.topic, text, &local_time_string());
        if let Some(display) = display {
            self.view.append(Rendered::user(display));
        }
        self.history.append(Message::user(outbound.as_str()));

        let request = self.chat_request(outbound);
        Some(self.run_turn(request).await)
    }

    /// Switch mode.  With an active session this is a hidden follow-up
    /// turn; without one the conversation restarts in the new mode.
    pub async fn change_mode(&mut self, mode: Mode) -> Option<TurnOutcome> {
        if mode == self.mode {
            return None;
        }
        tracing::info!(topic_code = %self.topic.code, from = %self.mode, to = %mode, "mode change");
        self.mode = mode;

        if self.session_id.is_none() {
            self.view.clear();
            return Some(self.send_initial_prompt().await);
        }

        let OutboundPrompt { outbound, .. } =
            prompt::mode_change(&self.topic, mode, &local_time_string());
        self.history.append(Message::user(outbound.as_str()));
        let request = self.chat_request(outbound);
        Some(self.run_turn(request).await)
    }

    /// Forget the current session locally and on the backend, then start
    /// over.
    pub async fn reset(&mut self) -> TurnOutcome {
        let old = self
            .session_id
            .take()
            .or_else(|| self.store.session_id(&self.topic.code));

        if let Err(e) = self.store.clear_session_id(&self.topic.code) {
            tracing::warn!(topic_code = %self.topic.code, error = %e, "failed to clear stored session id");
        }
        if let Some(old) = old.clone() {
            let backend = Arc::clone(&self.backend);
            self.background.spawn(async move {
                if let Err(e) = backend.clear_history(&old).await {
                    tracing::warn!(session_id = %old, error = %e, "clear-chat-history failed");
                }
            });
        }

        self.history.reset();
        self.view.clear();
        TraceEvent::SessionReset {
            topic_code: self.topic.code.clone(),
            old_session_id: old,
        }
        .emit();

        self.send_initial_prompt().await
    }

    /// Validate and submit a self-assessed understanding rating for this
    /// topic, then confirm it in the conversation.
    pub async fn rate_topic(&mut self, progress: &dyn ProgressBackend, rating: u8, notes: &str) -> Result<()> {
        forms::rate_topic(
            progress,
            RateTopicRequest {
                topic_code: self.topic.code.clone(),
                topic_title: self.topic.title.clone(),
                rating,
                notes: notes.to_owned(),
            },
        )
        .await?;
        self.post_system_message(RATING_SAVED);
        Ok(())
    }

    /// Validate and submit an exam practice score for this topic, then
    /// confirm it in the conversation.
    pub async fn record_exam(
        &mut self,
        progress: &dyn ProgressBackend,
        question_type: &str,
        difficulty: u8,
        score: u32,
        max_score: u32,
    ) -> Result<()> {
        forms::record_exam(
            progress,
            RecordExamRequest {
                topic_code: self.topic.code.clone(),
                question_type: question_type.to_owned(),
                difficulty,
                score,
                max_score,
            },
        )
        .await?;
        self.post_system_message(EXAM_RECORDED);
        Ok(())
    }

    /// Display-only system message.  Not added to history.
    pub fn post_system_message(&self, text: &str) {
        self.view.append(Rendered::system(text));
    }

    /// Wait for outstanding persistence calls.
    pub async fn drain_background(&mut self) {
        while let Some(joined) = self.background.join_next().await {
            if let Err(e) = joined {
                tracing::warn!(error = %e, "background task failed");
            }
        }
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Turn plumbing
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// A chat request for `question`, which must already be the last
    /// history entry.
    fn chat_request(&self, question: String) -> TurnRequest {
        let messages = self.history.messages();
        let context = &messages[..messages.len().saturating_sub(1)];
        TurnRequest::Chat(ChatRequest {
            question,
            topic_code: self.topic.code.clone(),
            mode: self.mode,
            stream: true,
            request_id: next_request_id(),
            session_id: self.session_id.clone(),
            history: context.to_vec(),
        })
    }

    async fn run_turn(&mut self, request: TurnRequest) -> TurnOutcome {
        let outcome = StreamConsumer::new(
            self.backend.as_ref(),
            self.view.as_ref(),
            &self.config.thinking_text,
        )
        .run(request)
        .await;

        if let Some(assigned) = outcome.session_id() {
            self.adopt_session(assigned.to_owned());
        }

        if let TurnOutcome::Completed { text, .. } = &outcome {
            self.history.append(Message::assistant(text.as_str()));
            self.history.trim(self.config.max_history);
            self.persist_response(text.clone());
        }

        outcome
    }

    fn adopt_session(&mut self, session_id: String) {
        if self.session_id.as_deref() == Some(session_id.as_str()) {
            return;
        }
        if let Err(e) = self.store.set_session_id(&self.topic.code, &session_id) {
            tracing::warn!(topic_code = %self.topic.code, error = %e, "failed to persist session id");
        }
        tracing::info!(topic_code = %self.topic.code, session_id = %session_id, "session assigned");
        self.session_id = Some(session_id);
    }

    fn persist_response(&mut self, text: String) {
        let Some(session_id) = self.session_id.clone() else {
            tracing::debug!("no session yet; response not persisted");
            return;
        };
        let backend = Arc::clone(&self.backend);
        self.background.spawn(async move {
            let chars = text.chars().count();
            let ok = match backend.save_response(&session_id, &text).await {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!(session_id = %session_id, error = %e, "save-response failed");
                    false
                }
            };
            TraceEvent::ResponsePersisted {
                session_id,
                chars,
                ok,
            }
            .emit();
        });
    }
}
