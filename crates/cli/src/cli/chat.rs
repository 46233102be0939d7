//! `tutor chat`: interactive REPL command.
//!
//! Builds a session controller for one topic, resumes or starts the
//! conversation, then reads lines until `/exit` or Ctrl+D.  Plain lines
//! are questions; slash-commands map to the controller's other intents.

use std::sync::Arc;

use tutor_backend::RestBackend;
use tutor_chat::SessionController;
use tutor_domain::config::Config;
use tutor_domain::{Mode, Topic};
use tutor_progress::activity;
use tutor_sessions::LocalStore;

use super::slash::{self, Slash};
use crate::terminal::TerminalView;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Public entry point
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn chat(config: Config, topic: Topic, mode: Option<Mode>) -> anyhow::Result<()> {
    let backend = Arc::new(RestBackend::new(&config.backend)?);
    let store = Arc::new(LocalStore::open(&config.storage.state_path)?);
    let view = Arc::new(TerminalView::new());

    let mut controller = SessionController::new(
        topic.clone(),
        config.chat.clone(),
        backend.clone(),
        store,
        view,
    );
    if let Some(mode) = mode {
        controller = controller.with_mode(mode);
    }

    let history_path = dirs::home_dir()
        .unwrap_or_default()
        .join(".tutor")
        .join("chat_history.txt");
    if let Some(parent) = history_path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let mut rl = rustyline::DefaultEditor::new()?;
    let _ = rl.load_history(&history_path);

    eprintln!("Topic {} {}  |  mode: {}", topic.code, topic.title, controller.mode());
    eprintln!("Type /help for commands, Ctrl+D to exit");
    match activity::track_page_view(backend.as_ref()).await {
        Ok(Some(badge)) => {
            eprintln!("{}", badge.label());
            if let Some(warning) = badge.warning() {
                eprintln!("{warning}");
            }
        }
        Ok(None) => {}
        Err(e) => tracing::warn!(error = %e, "activity tracking failed"),
    }
    eprintln!();

    controller.start().await;

    loop {
        match rl.readline("you> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                rl.add_history_entry(&line).ok();

                if trimmed.starts_with('/') {
                    if handle_slash_command(trimmed, &mut controller, backend.as_ref()).await {
                        break;
                    }
                    continue;
                }

                controller.send_message(trimmed).await;
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                eprintln!("(Use Ctrl+D or /exit to quit)");
            }
            Err(rustyline::error::ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("\x1B[31mreadline error: {e}\x1B[0m");
                break;
            }
        }
    }

    rl.save_history(&history_path).ok();
    controller.drain_background().await;
    eprintln!("Goodbye!");
    Ok(())
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Slash command handling
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Process a slash command.  Returns `true` if the REPL should exit.
async fn handle_slash_command(
    input: &str,
    controller: &mut SessionController,
    progress: &RestBackend,
) -> bool {
    match slash::parse(input) {
        Slash::Exit => return true,
        Slash::Help => eprintln!("{}", slash::HELP),
        Slash::Usage(usage) => eprintln!("Usage: {usage}"),
        Slash::Unknown(other) => {
            eprintln!("Unknown command: {other}  (type /help for a list)");
        }
        Slash::Mode(mode) => {
            if controller.change_mode(mode).await.is_none() {
                eprintln!("Already in {mode} mode");
            }
        }
        Slash::Reset => {
            controller.reset().await;
        }
        Slash::Rate { rating, notes } => {
            if let Err(e) = controller.rate_topic(progress, rating, &notes).await {
                report(&e);
            }
        }
        Slash::Exam {
            question_type,
            difficulty,
            score,
            max_score,
        } => {
            if let Err(e) = controller
                .record_exam(progress, &question_type, difficulty, score, max_score)
                .await
            {
                report(&e);
            }
        }
    }
    false
}

fn report(error: &tutor_domain::Error) {
    if let tutor_domain::Error::Validation(message) = error {
        eprintln!("\x1B[33m{message}\x1B[0m");
    } else {
        eprintln!("\x1B[31merror: {error}\x1B[0m");
    }
}
