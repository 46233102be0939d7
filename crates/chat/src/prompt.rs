//! Outbound prompt construction.
//!
//! Every prompt sent to the backend ends with a context tag on its own
//! paragraph:
//!
//! ```text
//! <visible text>
//!
//! [CONTEXT: Topic 1.1.1 Structure of the processor | 14:05:09]
//! ```
//!
//! The tagged form is what goes over the wire and into history; the
//! display form is recovered with [`strip_context`].

use tutor_domain::{Mode, Topic};

const CONTEXT_MARKER: &str = "\n\n[CONTEXT: ";

/// A prompt ready to send.  `display` is `None` for prompts that must
/// never be shown (initial and mode-change turns).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundPrompt {
    pub outbound: String,
    pub display: Option<String>,
}

/// Wall-clock time in the form used inside context tags.
pub fn local_time_string() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}

/// `[CONTEXT: Topic {code} {title} | {time}]`
pub fn context_tag(topic: &Topic, time: &str) -> String {
    format!("[CONTEXT: Topic {} {} | {}]", topic.code, topic.title, time)
}

fn with_context(text: &str, topic: &Topic, time: &str) -> String {
    format!("{text}\n\n{}", context_tag(topic, time))
}

/// The templated opener for a mode, before the context tag.
pub fn initial_text(mode: Mode, title: &str) -> String {
    match mode {
        Mode::Explore => format!(
            "I'd like to learn about {title}. Please give me a comprehensive explanation."
        ),
        Mode::Practice => format!(
            "I'd like to practice {title}. Please give me some practice questions to test my understanding."
        ),
        Mode::Code => format!(
            "I'd like to see coding examples for {title}. Please show me some code with clear explanations."
        ),
        Mode::Review => format!(
            "I'd like to review {title}. Please give me a concise revision summary of the key points."
        ),
        Mode::Test => format!(
            "I'd like to test my knowledge of {title}. Please give me a short mini-assessment."
        ),
    }
}

/// Opening turn for a topic in the given mode.  Never displayed.
pub fn initial_prompt(topic: &Topic, mode: Mode, time: &str) -> OutboundPrompt {
    OutboundPrompt {
        outbound: with_context(&initial_text(mode, &topic.title), topic, time),
        display: None,
    }
}

/// A user-typed question.  Displayed without the tag.
pub fn follow_up(topic: &Topic, text: &str, time: &str) -> OutboundPrompt {
    OutboundPrompt {
        outbound: with_context(text, topic, time),
        display: Some(text.to_owned()),
    }
}

/// Short prompt announcing a mode switch on an active session.  Never
/// displayed.
pub fn mode_change(topic: &Topic, mode: Mode, time: &str) -> OutboundPrompt {
    OutboundPrompt {
        outbound: with_context(&format!("I'd like to {mode} {}.", topic.title), topic, time),
        display: None,
    }
}

/// Remove a trailing context tag, if present.
///
/// Only the last `\n\n[CONTEXT: ...]` paragraph is removed, so text that
/// itself contains the marker survives intact.
pub fn strip_context(content: &str) -> &str {
    match content.rfind(CONTEXT_MARKER) {
        Some(pos) if content[pos..].trim_end().ends_with(']') => &content[..pos],
        _ => content,
    }
}

/// The body of the trailing context tag (between `[CONTEXT: ` and `]`).
pub fn context_of(content: &str) -> Option<&str> {
    let pos = content.rfind(CONTEXT_MARKER)?;
    content[pos + CONTEXT_MARKER.len()..]
        .trim_end()
        .strip_suffix(']')
}

/// Whether a user message is one of the templated openers (initial or
/// mode-change) rather than something the student typed.
pub fn is_templated_opener(content: &str) -> bool {
    let visible = strip_context(content).trim_start();
    openers().any(|opener| visible.starts_with(opener.as_str()))
}

fn openers() -> impl Iterator<Item = String> {
    let initial = [
        "I'd like to learn about ",
        "I'd like to practice ",
        "I'd like to see coding examples for ",
        "I'd like to review ",
        "I'd like to test my knowledge of ",
    ]
    .into_iter()
    .map(str::to_owned);
    let switches = Mode::ALL
        .into_iter()
        .map(|mode| format!("I'd like to {mode} "));
    initial.chain(switches)
}
