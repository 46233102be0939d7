use serde::{Deserialize, Serialize};
use std::pin::Pin;

/// A boxed async stream, used for the chat event stream.
pub type BoxStream<'a, T> = Pin<Box<dyn futures_core::Stream<Item = T> + Send + 'a>>;

/// Events delivered on a per-request chat stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerEvent {
    /// Subscription acknowledged; carries no text.
    Connected,

    /// An incremental text fragment.
    Text { text: String },

    /// Generation finished.  `full_response`, when present, is authoritative
    /// over whatever was accumulated from fragments.
    Done {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        full_response: Option<String>,
    },
}

impl ServerEvent {
    pub fn text(s: impl Into<String>) -> Self {
        ServerEvent::Text { text: s.into() }
    }

    pub fn done(full: Option<&str>) -> Self {
        ServerEvent::Done {
            full_response: full.map(str::to_owned),
        }
    }
}
