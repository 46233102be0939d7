//! One-shot subcommands for the progress widgets.

use std::path::Path;

use anyhow::Context;
use chrono::{Local, NaiveDate};
use tutor_backend::{RestBackend, TutorBackend};
use tutor_domain::config::Config;
use tutor_domain::Topic;
use tutor_progress::{activity, countdown, exam_pdf, notes, spaced, MonthCalendar, YearMonth};
use tutor_sessions::LocalStore;

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// `tutor reset`: drop the stored session for a topic and purge it on
/// the backend.
pub async fn reset(config: &Config, topic_code: &str) -> anyhow::Result<()> {
    let store = LocalStore::open(&config.storage.state_path)?;
    let Some(session_id) = store.session_id(topic_code) else {
        println!("No stored conversation for {topic_code}");
        return Ok(());
    };
    store.clear_session_id(topic_code)?;

    let backend = RestBackend::new(&config.backend)?;
    if let Err(e) = backend.clear_history(&session_id).await {
        tracing::warn!(session_id = %session_id, error = %e, "clear-chat-history failed");
    }
    println!("Cleared conversation {session_id} for {topic_code}");
    Ok(())
}

/// `tutor review`: list due topics, or mark one reviewed.
pub async fn review(config: &Config, done: Option<&str>) -> anyhow::Result<()> {
    let backend = RestBackend::new(&config.backend)?;
    if let Some(code) = done {
        spaced::mark_reviewed(&backend, code).await?;
        println!("Marked {code} as reviewed");
        return Ok(());
    }

    let due = spaced::load_due_topics(&backend, today()).await?;
    if due.is_empty() {
        println!("No topics to review today! Great job staying on top of your studies.");
        return Ok(());
    }
    for topic in due {
        println!(
            "{:<8} {:<40} {}  {} [{}]",
            topic.topic_code,
            topic.topic_title,
            topic.stars(),
            topic.last_studied_label(),
            topic.urgency.as_str()
        );
    }
    Ok(())
}

/// `tutor calendar`.
pub async fn calendar(config: &Config, month: Option<&str>) -> anyhow::Result<()> {
    let today = today();
    let month = match month {
        Some(raw) => raw.parse::<YearMonth>()?,
        None => YearMonth::of(today),
    };
    let backend = RestBackend::new(&config.backend)?;
    let (calendar, badge) = activity::load_calendar(&backend, month, today).await?;

    print!("{}", render_calendar(&calendar));
    println!("{}", badge.label());
    if let Some(warning) = badge.warning() {
        println!("{warning}");
    }
    Ok(())
}

/// Plain-text month grid.  Each day shows its number and one mark per
/// activity level; today is bracketed.
pub fn render_calendar(calendar: &MonthCalendar) -> String {
    const MARKS: [&str; 5] = ["  ", ". ", ": ", "* ", "# "];
    let mut out = format!(
        "{}  (prev {}, next {})\n",
        calendar.month,
        calendar.month.prev(),
        calendar.month.next()
    );
    out.push_str("  S    M    T    W    T    F    S\n");
    for week in calendar.weeks() {
        for cell in week {
            match cell {
                Some(cell) => {
                    let day = chrono::Datelike::day(&cell.date);
                    let mark = MARKS[usize::from(cell.level.min(4))];
                    if cell.today {
                        out.push_str(&format!("[{day:>2}]{}", &mark[..1]));
                    } else {
                        out.push_str(&format!(" {day:>2}{mark}"));
                    }
                }
                None => out.push_str("     "),
            }
        }
        out.push('\n');
    }
    out
}

/// `tutor layout`.
pub fn layout(config: &Config, dock: Option<bool>, toggle_chat: bool) -> anyhow::Result<()> {
    let store = LocalStore::open(&config.storage.state_path)?;
    let (docked, collapsed) = apply_layout(&store, dock, toggle_chat)?;
    println!(
        "notes panel: {}",
        if docked { "docked" } else { "floating" }
    );
    println!(
        "chat panel:  {}",
        if collapsed { "collapsed" } else { "expanded" }
    );
    Ok(())
}

/// Apply the requested changes and return `(docked, collapsed)`.
pub fn apply_layout(
    store: &LocalStore,
    dock: Option<bool>,
    toggle_chat: bool,
) -> tutor_domain::Result<(bool, bool)> {
    if let Some(docked) = dock {
        store.set_panel_docked(docked)?;
    }
    let collapsed = if toggle_chat {
        store.toggle_chat_collapsed()?
    } else {
        store.chat_collapsed()
    };
    Ok((store.panel_docked(), collapsed))
}

/// `tutor countdown`.
pub fn show_countdown(config: &Config) {
    for c in countdown::countdowns(&config.progress, today()) {
        println!(
            "{:<10} {:<16} {:>4} days left  {:>5.1}% of prep elapsed  [{}]",
            c.name,
            c.date_label(),
            c.days_remaining,
            c.percent_elapsed,
            c.urgency.as_str()
        );
    }
}

/// `tutor notes`.
pub fn show_notes(config: &Config, topic_code: &str) {
    match notes::lookup(&config.notes, topic_code) {
        Some(found) => println!("{} (page {})", found.path, found.page),
        None => println!("{}", notes::NO_NOTES),
    }
}

/// `tutor exam-pdf`.
pub async fn generate_exam_pdf(config: &Config, topic: &Topic, file: &Path) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("reading {}", file.display()))?;
    let backend = RestBackend::new(&config.backend)?;
    let url = exam_pdf::generate(&backend, topic, &content).await?;
    println!("{url}");
    Ok(())
}
