pub mod chat;
pub mod slash;
pub mod widgets;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tutor_domain::config::Config;

/// tutor: terminal client for the study tutor.
#[derive(Debug, Parser)]
#[command(name = "tutor", version, about)]
pub struct Cli {
    /// Config file (defaults to `$TUTOR_CONFIG`, then `tutor.toml`).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Chat with the tutor about a topic.
    Chat {
        /// Topic code, e.g. "1.1.1".
        #[arg(long)]
        topic: String,
        /// Human-readable topic title.
        #[arg(long)]
        title: String,
        /// explore, practice, code, review or test.
        #[arg(long)]
        mode: Option<String>,
    },
    /// Forget the stored conversation for a topic.
    Reset {
        #[arg(long)]
        topic: String,
    },
    /// List topics due for spaced-repetition review.
    Review {
        /// Mark this topic as reviewed instead of listing.
        #[arg(long)]
        done: Option<String>,
    },
    /// Show the study activity calendar and streak.
    Calendar {
        /// Month to show, as YYYY-MM (defaults to the current month).
        #[arg(long)]
        month: Option<String>,
    },
    /// Days remaining until each configured exam.
    Countdown,
    /// Resolve the notes PDF for a topic.
    Notes {
        #[arg(long)]
        topic: String,
    },
    /// Generate an exam-paper PDF from a text file.
    ExamPdf {
        #[arg(long)]
        topic: String,
        #[arg(long)]
        title: String,
        /// File holding the exam content.
        #[arg(long)]
        file: PathBuf,
    },
    /// Show or change the saved panel layout.
    Layout {
        /// Dock (true) or float (false) the notes panel.
        #[arg(long)]
        dock: Option<bool>,
        /// Flip the collapsed state of the chat panel.
        #[arg(long)]
        toggle_chat: bool,
    },
    /// Print the resolved configuration (with defaults) as TOML.
    Config,
}

// ── Config loading helper ─────────────────────────────────────────────

/// Load the configuration from `explicit`, else `TUTOR_CONFIG`, else
/// `tutor.toml`.  A missing file yields the defaults.  Returns the parsed
/// [`Config`] and the path that was used.
pub fn load_config(explicit: Option<&Path>) -> anyhow::Result<(Config, PathBuf)> {
    let config_path = explicit.map(Path::to_path_buf).unwrap_or_else(|| {
        std::env::var_os("TUTOR_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("tutor.toml"))
    });

    let config = if config_path.exists() {
        let raw = std::fs::read_to_string(&config_path)
            .with_context(|| format!("reading {}", config_path.display()))?;
        toml::from_str(&raw).with_context(|| format!("parsing {}", config_path.display()))?
    } else {
        tracing::debug!(path = %config_path.display(), "no config file; using defaults");
        Config::default()
    };

    Ok((config, config_path))
}
