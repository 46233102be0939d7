//! Page-load session resolution: resume a persisted conversation or start
//! fresh.

use tutor_backend::TutorBackend;
use tutor_domain::{Message, Role};
use tutor_sessions::LocalStore;

use crate::prompt::{is_templated_opener, strip_context};

/// Why the resolver decided to start over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FreshReason {
    NoStoredSession,
    /// The stored session could not be loaded.  Carries the error text.
    FetchFailed(String),
    EmptyHistory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Fresh {
        reason: FreshReason,
    },
    /// `messages` is the full server-side record, tags and openers intact.
    Resumed {
        session_id: String,
        messages: Vec<Message>,
    },
}

/// Look up the stored session for `topic_code` and try to load its
/// history.  Never fails: every error path resolves to
/// [`Resolution::Fresh`].
pub async fn resolve(store: &LocalStore, backend: &dyn TutorBackend, topic_code: &str) -> Resolution {
    let Some(session_id) = store.session_id(topic_code) else {
        return Resolution::Fresh {
            reason: FreshReason::NoStoredSession,
        };
    };

    match backend.recent_messages(&session_id).await {
        Ok(messages) if messages.is_empty() => {
            tracing::info!(topic_code, session_id = %session_id, "stored session has no messages");
            Resolution::Fresh {
                reason: FreshReason::EmptyHistory,
            }
        }
        Ok(messages) => Resolution::Resumed {
            session_id,
            messages,
        },
        Err(e) => {
            tracing::warn!(topic_code, session_id = %session_id, error = %e, "could not load stored session");
            Resolution::Fresh {
                reason: FreshReason::FetchFailed(e.to_string()),
            }
        }
    }
}

/// The messages of a resumed history that should be painted: templated
/// user openers are dropped and context tags stripped.
pub fn visible_history(messages: &[Message]) -> Vec<Message> {
    messages
        .iter()
        .filter(|m| !(m.role == Role::User && is_templated_opener(&m.content)))
        .map(|m| Message::new(m.role, strip_context(&m.content)))
        .collect()
}
