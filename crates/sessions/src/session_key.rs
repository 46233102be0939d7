//! Storage keys used in the [`LocalStore`](crate::LocalStore).
//!
//! - `tutor:session:<topicCode>`: backend-assigned session ID
//! - `pdf-sidebar-docked`: notes panel docked (bool, default true)
//! - `global-chat-collapsed`: chat panel collapsed (bool, default false)

pub const PANEL_DOCKED_KEY: &str = "pdf-sidebar-docked";
pub const CHAT_COLLAPSED_KEY: &str = "global-chat-collapsed";

/// Storage key for the session ID of a topic.  Surrounding whitespace in
/// the code is ignored so `" 1.1.1"` and `"1.1.1"` share a session.
pub fn session_storage_key(topic_code: &str) -> String {
    format!("tutor:session:{}", topic_code.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_derived_from_topic_code() {
        assert_eq!(session_storage_key("1.1.1"), "tutor:session:1.1.1");
        assert_eq!(session_storage_key(" 1.1.1 "), "tutor:session:1.1.1");
    }

    #[test]
    fn distinct_topics_get_distinct_keys() {
        assert_ne!(session_storage_key("1.1"), session_storage_key("1.1.1"));
    }
}
