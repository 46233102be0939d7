use serde::Serialize;

/// Structured trace events emitted across all tutor crates.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    BackendCall {
        endpoint: String,
        status: u16,
        duration_ms: u64,
    },
    SessionResolved {
        topic_code: String,
        session_id: Option<String>,
        resumed: bool,
        messages: usize,
    },
    SessionReset {
        topic_code: String,
        old_session_id: Option<String>,
    },
    TurnStarted {
        request_id: String,
        kind: String,
        topic_code: String,
        mode: String,
    },
    TurnFinished {
        request_id: String,
        outcome: String,
        chars: usize,
        duration_ms: u64,
    },
    HistoryTrimmed {
        dropped: usize,
        retained: usize,
    },
    ResponsePersisted {
        session_id: String,
        chars: usize,
        ok: bool,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "tutor_event");
    }
}
