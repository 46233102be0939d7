use clap::Parser;
use tracing_subscriber::EnvFilter;

use tutor_cli::cli::{chat, load_config, widgets, Cli, Command};
use tutor_domain::{Mode, Topic};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_cli_tracing(cli.json_logs);

    let (config, config_path) = load_config(cli.config.as_deref())?;
    tracing::debug!(path = %config_path.display(), "config loaded");

    match cli.command {
        Command::Chat { topic, title, mode } => {
            let mode = mode.as_deref().map(Mode::parse_lossy);
            chat::chat(config, Topic::new(topic, title), mode).await
        }
        Command::Reset { topic } => widgets::reset(&config, &topic).await,
        Command::Review { done } => widgets::review(&config, done.as_deref()).await,
        Command::Calendar { month } => widgets::calendar(&config, month.as_deref()).await,
        Command::Countdown => {
            widgets::show_countdown(&config);
            Ok(())
        }
        Command::Notes { topic } => {
            widgets::show_notes(&config, &topic);
            Ok(())
        }
        Command::ExamPdf { topic, title, file } => {
            widgets::generate_exam_pdf(&config, &Topic::new(topic, title), &file).await
        }
        Command::Layout { dock, toggle_chat } => widgets::layout(&config, dock, toggle_chat),
        Command::Config => {
            print!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

/// Log to stderr so stdout stays clean for conversation output.
fn init_cli_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.compact().init();
    }
}
