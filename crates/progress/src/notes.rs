//! Topic code to notes-PDF resolution.

use tutor_domain::config::{NotesConfig, PdfRef};
use tutor_domain::topic::code_prefix;

pub const DEFAULT_KEY: &str = "default";
pub const NO_NOTES: &str = "No notes content available for this topic";

/// A resolved notes document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotesRef {
    /// Map key that matched.
    pub key: String,
    /// `{resources_path}/{file}`.
    pub path: String,
    pub page: u32,
}

/// Find the notes for `topic_code`.
///
/// Tried in order: the exact code; its first three segments; the first
/// key (in map order) starting with its first two segments; the
/// `default` entry.
pub fn lookup(config: &NotesConfig, topic_code: &str) -> Option<NotesRef> {
    let code = topic_code.trim();
    let found = config
        .pdfs
        .get_key_value(code)
        .or_else(|| config.pdfs.get_key_value(code_prefix(code, 3).as_str()))
        .or_else(|| {
            let section = code_prefix(code, 2);
            config
                .pdfs
                .iter()
                .find(|(key, _)| key.as_str() != DEFAULT_KEY && key.starts_with(section.as_str()))
        })
        .or_else(|| config.pdfs.get_key_value(DEFAULT_KEY));

    match found {
        Some((key, pdf)) => Some(resolve(config, key, pdf)),
        None => {
            tracing::debug!(topic_code = code, "no notes mapping");
            None
        }
    }
}

fn resolve(config: &NotesConfig, key: &str, pdf: &PdfRef) -> NotesRef {
    NotesRef {
        key: key.to_owned(),
        path: format!("{}/{}", config.resources_path.trim_end_matches('/'), pdf.file),
        page: pdf.page.max(1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(keys: &[&str]) -> NotesConfig {
        let mut config = NotesConfig::default();
        for key in keys {
            config.pdfs.insert(
                (*key).to_owned(),
                PdfRef {
                    file: format!("{key}.pdf"),
                    page: 1,
                },
            );
        }
        config
    }

    #[test]
    fn exact_match_wins() {
        let c = config(&["1.1.1", "1.1.2", "default"]);
        let notes = lookup(&c, "1.1.2").unwrap();
        assert_eq!(notes.key, "1.1.2");
        assert_eq!(notes.path, "/resources/1.1.2.pdf");
        assert_eq!(notes.page, 1);
    }

    #[test]
    fn subtopic_falls_back_to_three_segment_prefix() {
        let c = config(&["1.1.1", "1.1.2"]);
        assert_eq!(lookup(&c, "1.1.2.a").unwrap().key, "1.1.2");
    }

    #[test]
    fn unknown_subsection_uses_first_key_in_section() {
        let c = config(&["1.2.1", "1.2.2", "default"]);
        assert_eq!(lookup(&c, "1.2.9").unwrap().key, "1.2.1");
    }

    #[test]
    fn default_then_nothing() {
        let c = config(&["2.1.1", "default"]);
        assert_eq!(lookup(&c, "9.9.9").unwrap().key, "default");
        assert_eq!(lookup(&config(&["2.1.1"]), "9.9.9"), None);
    }
}
