//! End-to-end controller behaviour against a scripted backend.

mod common;

use std::collections::HashSet;
use std::sync::Arc;

use common::{reply, Call, Harness, ScriptedBackend};
use tutor_backend::AcceptResponse;
use tutor_chat::controller::RESUME_FAILED_NOTICE;
use tutor_chat::{strip_context, MessageList, StreamConsumer, TurnOutcome, TurnRequest};
use tutor_domain::config::ChatConfig;
use tutor_domain::{Message, Mode, Role, ServerEvent};
use tutor_sessions::LocalStore;

fn memory_store() -> Arc<LocalStore> {
    Arc::new(LocalStore::in_memory())
}

fn opener() -> Message {
    Message::user(
        "I'd like to learn about Structure and function of the processor. Please give me a comprehensive explanation.\n\n[CONTEXT: Topic 1.1.1 Structure and function of the processor | 09:00:00]",
    )
}

fn request_ids(calls: &[Call]) -> (Vec<String>, Vec<String>) {
    let mut posted = Vec::new();
    let mut subscribed = Vec::new();
    for call in calls {
        match call {
            Call::Initial(r) => posted.push(r.request_id.clone()),
            Call::Chat(r) => posted.push(r.request_id.clone()),
            Call::Subscribe(id) => subscribed.push(id.clone()),
            _ => {}
        }
    }
    (posted, subscribed)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Session resolution
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[tokio::test]
async fn fresh_start_persists_session_and_reload_resumes_it() {
    let dir = tempfile::tempdir().unwrap();

    // First load: nothing stored.
    let backend = ScriptedBackend::new();
    backend.accept_with_session("sess_1").stream(reply(&["Hello", " there"]));
    let store = Arc::new(LocalStore::open(dir.path()).unwrap());
    let mut h = Harness::new(backend.clone(), store);

    let outcome = h.controller.start().await.unwrap();
    assert_eq!(outcome.text(), Some("Hello there"));
    h.controller.drain_background().await;

    let calls = backend.calls();
    let Call::Initial(initial) = &calls[0] else {
        panic!("expected initial prompt, got {:?}", calls[0]);
    };
    assert_eq!(initial.topic_code, "1.1.1");
    assert_eq!(initial.mode, Mode::Explore);
    assert!(initial.stream);
    assert_eq!(initial.session_id, None);
    assert!(initial.prompt.starts_with("I'd like to learn about Structure and function"));
    assert!(initial.prompt.contains("\n\n[CONTEXT: Topic 1.1.1 "));
    assert_eq!(calls[1], Call::Subscribe(initial.request_id.clone()));
    assert!(calls.contains(&Call::Save {
        session_id: "sess_1".into(),
        response: "Hello there".into(),
    }));
    assert_eq!(h.controller.session_id(), Some("sess_1"));

    // The opener is never painted.
    assert_eq!(h.view.texts(), vec![(Role::Assistant, "Hello there".to_owned())]);

    // Second load from the same state directory.
    let reopened = Arc::new(LocalStore::open(dir.path()).unwrap());
    assert_eq!(reopened.session_id("1.1.1").as_deref(), Some("sess_1"));

    let backend = ScriptedBackend::new();
    backend.recent(Ok(vec![opener(), Message::assistant("Hello there")]));
    let mut h = Harness::new(backend.clone(), reopened);

    assert!(h.controller.start().await.is_none());
    assert_eq!(backend.calls(), vec![Call::Recent("sess_1".into())]);
    assert_eq!(h.view.texts(), vec![(Role::Assistant, "Hello there".to_owned())]);
    // The hidden opener stays in history as context.
    assert_eq!(h.controller.history().len(), 2);
}

#[tokio::test]
async fn trailing_user_message_gets_an_automatic_reply() {
    let store = memory_store();
    store.set_session_id("1.1.1", "sess_7").unwrap();
    let pending = "What is a bus?\n\n[CONTEXT: Topic 1.1.1 Structure and function of the processor | 09:05:00]";

    let backend = ScriptedBackend::new();
    backend
        .recent(Ok(vec![
            opener(),
            Message::assistant("The processor..."),
            Message::user(pending),
        ]))
        .stream(reply(&["A bus is..."]));
    let mut h = Harness::new(backend.clone(), store);

    let outcome = h.controller.start().await.unwrap();
    assert_eq!(outcome.text(), Some("A bus is..."));

    let calls = backend.calls();
    assert_eq!(calls[0], Call::Recent("sess_7".into()));
    let Call::Chat(chat) = &calls[1] else {
        panic!("expected chat, got {:?}", calls[1]);
    };
    assert_eq!(chat.question, pending);
    assert_eq!(chat.session_id.as_deref(), Some("sess_7"));
    assert_eq!(chat.history.len(), 2);

    assert_eq!(
        h.view.texts(),
        vec![
            (Role::Assistant, "The processor...".to_owned()),
            (Role::User, "What is a bus?".to_owned()),
            (Role::Assistant, "A bus is...".to_owned()),
        ]
    );
    // The trailing message is not duplicated.
    assert_eq!(h.controller.history().len(), 4);
}

#[tokio::test]
async fn failed_resume_shows_notice_and_starts_fresh() {
    let store = memory_store();
    store.set_session_id("1.1.1", "sess_gone").unwrap();
    let backend = ScriptedBackend::new();
    backend.recent(Err("connection refused".into()));
    let mut h = Harness::new(backend.clone(), store);

    let outcome = h.controller.start().await.unwrap();
    assert!(outcome.is_completed());
    assert_eq!(h.view.notices(), vec![RESUME_FAILED_NOTICE.to_owned()]);

    let calls = backend.calls();
    assert_eq!(calls[0], Call::Recent("sess_gone".into()));
    assert!(matches!(&calls[1], Call::Initial(r) if r.session_id.is_none()));
    assert!(!h.view.texts().is_empty());
}

#[tokio::test]
async fn empty_resumed_history_starts_fresh_without_notice() {
    let store = memory_store();
    store.set_session_id("1.1.1", "sess_empty").unwrap();
    let backend = ScriptedBackend::new();
    let mut h = Harness::new(backend.clone(), store);

    h.controller.start().await.unwrap();
    assert!(h.view.notices().is_empty());
    assert!(matches!(backend.calls()[1], Call::Initial(_)));
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Turns
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[tokio::test]
async fn final_response_overrides_mismatched_fragments() {
    let backend = ScriptedBackend::new();
    backend.accept_with_session("sess_1").stream(vec![
        Ok(ServerEvent::Connected),
        Ok(ServerEvent::text("Hel")),
        Ok(ServerEvent::text("lo wor")),
        Ok(ServerEvent::text("ld")),
        Ok(ServerEvent::text("ld")),
        Ok(ServerEvent::done(Some("Hello world"))),
    ]);
    let mut h = Harness::new(backend.clone(), memory_store());

    h.controller.start().await.unwrap();
    assert_eq!(h.view.texts(), vec![(Role::Assistant, "Hello world".to_owned())]);
    assert_eq!(
        h.controller.history().last(),
        Some(&Message::assistant("Hello world"))
    );
}

#[tokio::test]
async fn follow_up_is_displayed_plain_and_sent_tagged() {
    let backend = ScriptedBackend::new();
    backend
        .accept_with_session("sess_1")
        .stream(reply(&["Intro"]))
        .stream(reply(&["Registers hold..."]));
    let mut h = Harness::new(backend.clone(), memory_store());
    h.controller.start().await.unwrap();
    backend.clear_calls();

    let outcome = h
        .controller
        .send_message("  What is a register?  ")
        .await
        .unwrap();
    assert_eq!(outcome.text(), Some("Registers hold..."));

    let calls = backend.calls();
    let Call::Chat(chat) = &calls[0] else {
        panic!("expected chat, got {:?}", calls[0]);
    };
    assert_eq!(strip_context(&chat.question), "What is a register?");
    assert_ne!(chat.question, "What is a register?");
    assert_eq!(chat.session_id.as_deref(), Some("sess_1"));
    // Context is the tagged opener and the first reply.
    assert_eq!(chat.history.len(), 2);
    assert!(chat.history[0].content.contains("[CONTEXT: "));

    let texts = h.view.texts();
    assert_eq!(texts[1], (Role::User, "What is a register?".to_owned()));
    assert_eq!(texts[2], (Role::Assistant, "Registers hold...".to_owned()));

    // History keeps the tagged question, not the display text.
    let history = h.controller.history().messages();
    assert_eq!(history[2].content, chat.question);
}

#[tokio::test]
async fn rejected_chat_shows_error_and_never_subscribes() {
    let backend = ScriptedBackend::new();
    backend.accept_with_session("sess_1").accept(AcceptResponse {
        success: Some(false),
        error: Some("Rate limit reached".into()),
        session_id: None,
    });
    let mut h = Harness::new(backend.clone(), memory_store());
    h.controller.start().await.unwrap();
    backend.clear_calls();

    let outcome = h.controller.send_message("Next question").await.unwrap();
    assert!(!outcome.is_completed());

    let calls = backend.calls();
    assert_eq!(calls.len(), 1);
    assert!(matches!(calls[0], Call::Chat(_)));
    assert_eq!(
        h.view.texts().last(),
        Some(&(Role::System, "Error: Rate limit reached".to_owned()))
    );
    assert_eq!(h.view.pending_count(), 0);
    assert_eq!(h.controller.history().last().map(|m| m.role), Some(Role::User));
}

#[tokio::test]
async fn post_transport_failure_is_shown_inline() {
    let backend = ScriptedBackend::new();
    backend.fail_post("connection refused");
    let mut h = Harness::new(backend.clone(), memory_store());

    let outcome = h.controller.start().await.unwrap();
    assert!(matches!(outcome, TurnOutcome::Failed { .. }));
    let texts = h.view.texts();
    assert_eq!(texts.len(), 1);
    assert_eq!(texts[0].0, Role::System);
    assert_eq!(backend.calls().len(), 1);
}

#[tokio::test]
async fn broken_stream_keeps_partial_text_or_fails_cleanly() {
    // Partial text survives as a soft completion.
    let backend = ScriptedBackend::new();
    backend.accept_with_session("sess_1").stream(vec![
        Ok(ServerEvent::text("Half an ans")),
        Err("connection reset".into()),
    ]);
    let mut h = Harness::new(backend.clone(), memory_store());
    match h.controller.start().await.unwrap() {
        TurnOutcome::Completed { text, partial, .. } => {
            assert_eq!(text, "Half an ans");
            assert!(partial);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    h.controller.drain_background().await;
    assert!(backend.calls().contains(&Call::Save {
        session_id: "sess_1".into(),
        response: "Half an ans".into(),
    }));

    // Nothing received: placeholder replaced by an error.
    let backend = ScriptedBackend::new();
    backend
        .accept_with_session("sess_2")
        .stream(vec![Ok(ServerEvent::Connected), Err("reset".into())]);
    let mut h = Harness::new(backend.clone(), memory_store());
    let outcome = h.controller.start().await.unwrap();
    assert!(!outcome.is_completed());
    assert_eq!(h.view.pending_count(), 0);
    assert_eq!(h.view.texts()[0].0, Role::System);
    // The assigned session is still remembered.
    assert_eq!(h.store.session_id("1.1.1").as_deref(), Some("sess_2"));
}

#[tokio::test]
async fn failed_save_is_silent() {
    let backend = ScriptedBackend::new();
    backend.accept_with_session("sess_1").failing_saves();
    let mut h = Harness::new(backend.clone(), memory_store());

    h.controller.start().await.unwrap();
    h.controller.drain_background().await;

    assert!(backend.calls().iter().any(|c| matches!(c, Call::Save { .. })));
    assert_eq!(h.view.texts(), vec![(Role::Assistant, "Reply".to_owned())]);
}

#[tokio::test]
async fn no_save_without_a_session() {
    let backend = ScriptedBackend::new();
    let mut h = Harness::new(backend.clone(), memory_store());
    h.controller.start().await.unwrap();
    h.controller.drain_background().await;
    assert!(!backend.calls().iter().any(|c| matches!(c, Call::Save { .. })));
}

#[tokio::test]
async fn history_is_trimmed_after_each_turn() {
    let backend = ScriptedBackend::new();
    backend.accept_with_session("sess_1");
    let config = ChatConfig {
        max_history: 4,
        ..ChatConfig::default()
    };
    let mut h = Harness::with_config(backend.clone(), memory_store(), config);
    h.controller.start().await.unwrap();

    for i in 0..5 {
        h.controller.send_message(&format!("question {i}")).await.unwrap();
        assert!(h.controller.history().len() <= 4);
    }
    let history = h.controller.history().messages();
    assert_eq!(history.len(), 4);
    assert_eq!(strip_context(&history[2].content), "question 4");
    assert_eq!(history[3].role, Role::Assistant);
}

#[tokio::test]
async fn request_ids_are_unique_and_match_their_subscriptions() {
    let backend = ScriptedBackend::new();
    backend.accept_with_session("sess_1");
    let mut h = Harness::new(backend.clone(), memory_store());
    h.controller.start().await.unwrap();
    for text in ["one", "two", "three"] {
        h.controller.send_message(text).await.unwrap();
    }
    h.controller.change_mode(Mode::Test).await.unwrap();

    let (posted, subscribed) = request_ids(&backend.calls());
    assert_eq!(posted.len(), 5);
    assert_eq!(posted, subscribed);
    assert_eq!(posted.iter().collect::<HashSet<_>>().len(), 5);
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Mode change and reset
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[tokio::test]
async fn mode_change_on_active_session_is_hidden() {
    let backend = ScriptedBackend::new();
    backend
        .accept_with_session("sess_1")
        .stream(reply(&["Intro"]))
        .stream(reply(&["Question 1: ..."]));
    let mut h = Harness::new(backend.clone(), memory_store());
    h.controller.start().await.unwrap();
    backend.clear_calls();

    h.controller.change_mode(Mode::Practice).await.unwrap();
    assert_eq!(h.controller.mode(), Mode::Practice);

    let calls = backend.calls();
    let Call::Chat(chat) = &calls[0] else {
        panic!("expected chat, got {:?}", calls[0]);
    };
    assert_eq!(chat.mode, Mode::Practice);
    assert_eq!(
        strip_context(&chat.question),
        "I'd like to practice Structure and function of the processor."
    );

    // No user bubble for the switch.
    assert_eq!(
        h.view.texts(),
        vec![
            (Role::Assistant, "Intro".to_owned()),
            (Role::Assistant, "Question 1: ...".to_owned()),
        ]
    );
    // But it is in history.
    assert_eq!(h.controller.history().messages()[2].content, chat.question);
}

#[tokio::test]
async fn mode_change_without_session_restarts_in_new_mode() {
    let backend = ScriptedBackend::new();
    let mut h = Harness::new(backend.clone(), memory_store());
    h.controller.start().await.unwrap();
    assert_eq!(h.controller.session_id(), None);
    backend.clear_calls();

    h.controller.change_mode(Mode::Code).await.unwrap();
    let calls = backend.calls();
    let Call::Initial(initial) = &calls[0] else {
        panic!("expected initial prompt, got {:?}", calls[0]);
    };
    assert_eq!(initial.mode, Mode::Code);
    assert!(initial.prompt.starts_with("I'd like to see coding examples for"));
    assert_eq!(h.view.texts().len(), 1);
}

#[tokio::test]
async fn reset_clears_everything_and_starts_a_new_session() {
    let backend = ScriptedBackend::new();
    backend
        .accept_with_session("sess_old")
        .accept(AcceptResponse::default())
        .accept_with_session("sess_new")
        .stream(reply(&["Old intro"]))
        .stream(reply(&["Old answer"]))
        .stream(reply(&["New intro"]));
    let store = memory_store();
    let mut h = Harness::new(backend.clone(), store.clone());
    h.controller.start().await.unwrap();
    h.controller.send_message("Something").await.unwrap();
    h.controller.drain_background().await;
    backend.clear_calls();

    let outcome = h.controller.reset().await;
    h.controller.drain_background().await;
    assert_eq!(outcome.text(), Some("New intro"));

    let calls = backend.calls();
    assert!(calls.contains(&Call::Clear("sess_old".into())));
    let Some(Call::Initial(initial)) = calls.iter().find(|c| matches!(c, Call::Initial(_))) else {
        panic!("no initial prompt after reset: {calls:?}");
    };
    assert_eq!(initial.session_id, None);

    assert_eq!(h.controller.session_id(), Some("sess_new"));
    assert_eq!(store.session_id("1.1.1").as_deref(), Some("sess_new"));
    assert_eq!(h.view.texts(), vec![(Role::Assistant, "New intro".to_owned())]);
    assert_eq!(h.controller.history().len(), 2);
}

#[tokio::test]
async fn blank_input_sends_nothing() {
    let backend = ScriptedBackend::new();
    let mut h = Harness::new(backend.clone(), memory_store());
    assert!(h.controller.send_message("").await.is_none());
    assert!(h.controller.send_message(" \t\n").await.is_none());
    assert!(backend.calls().is_empty());
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Overlapping turns
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

fn chat_turn(request_id: &str) -> TurnRequest {
    TurnRequest::Chat(tutor_backend::ChatRequest {
        question: "q".into(),
        topic_code: "1.1.1".into(),
        mode: Mode::Explore,
        stream: true,
        request_id: request_id.into(),
        session_id: None,
        history: Vec::new(),
    })
}

#[tokio::test]
async fn overlapping_turns_each_finish_their_own_placeholder() {
    let backend = ScriptedBackend::new();
    backend
        .stream_for("req_a", reply(&["A1", "A2", "A3"]))
        .stream_for("req_b", reply(&["B1", "B2"]));
    let view = MessageList::new();

    let mut first = StreamConsumer::new(backend.as_ref(), &view, "Thinking...");
    let mut second = StreamConsumer::new(backend.as_ref(), &view, "Thinking...");
    let (a, b) = tokio::join!(first.run(chat_turn("req_a")), second.run(chat_turn("req_b")));

    assert_eq!(a.text(), Some("A1A2A3"));
    assert_eq!(b.text(), Some("B1B2"));

    let entries = view.snapshot();
    assert_eq!(entries.len(), 2);
    for entry in entries {
        assert!(!entry.pending);
        let expected = match entry.request_id.as_deref() {
            Some("req_a") => "A1A2A3",
            Some("req_b") => "B1B2",
            other => panic!("unexpected owner {other:?}"),
        };
        assert_eq!(entry.rendered.text, expected);
    }
}
