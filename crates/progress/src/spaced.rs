//! Spaced-repetition reminders.
//!
//! A topic is due once the whole days since it was last studied reach the
//! review interval for its proficiency.  Topics never studied are never
//! due.

use chrono::{DateTime, NaiveDate};
use tutor_backend::{ProgressBackend, TopicProgress, TrackActivityRequest};
use tutor_domain::error::Result;

/// Days between reviews for a proficiency rating.
pub fn review_interval_days(proficiency: u8) -> i64 {
    match proficiency {
        1 => 1,
        2 => 2,
        3 => 4,
        4 => 7,
        5 => 14,
        _ => 3,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Urgency {
    Normal,
    Medium,
    High,
}

impl Urgency {
    pub fn for_days_since(days: i64) -> Self {
        if days > 7 {
            Urgency::High
        } else if days > 3 {
            Urgency::Medium
        } else {
            Urgency::Normal
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Urgency::Normal => "normal",
            Urgency::Medium => "medium",
            Urgency::High => "high",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueTopic {
    pub topic_code: String,
    pub topic_title: String,
    pub proficiency: u8,
    pub days_since: i64,
    pub urgency: Urgency,
}

impl DueTopic {
    pub fn last_studied_label(&self) -> String {
        format!("Last studied {} days ago", self.days_since)
    }

    /// Five-star proficiency indicator.
    pub fn stars(&self) -> String {
        (1..=5)
            .map(|i| if i <= self.proficiency { '★' } else { '☆' })
            .collect()
    }
}

/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp.
fn parse_last_studied(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

/// Topics due for review on `today`, weakest proficiency first.
pub fn due_topics(progress: &[TopicProgress], today: NaiveDate) -> Vec<DueTopic> {
    let mut due: Vec<DueTopic> = progress
        .iter()
        .filter_map(|topic| {
            let raw = topic.last_studied.as_deref()?;
            let Some(last) = parse_last_studied(raw) else {
                tracing::debug!(topic_code = %topic.topic_code, raw, "unparseable last-studied date");
                return None;
            };
            let days_since = (today - last).num_days();
            (days_since >= review_interval_days(topic.proficiency)).then(|| DueTopic {
                topic_code: topic.topic_code.clone(),
                topic_title: topic.topic_title.clone(),
                proficiency: topic.proficiency,
                days_since,
                urgency: Urgency::for_days_since(days_since),
            })
        })
        .collect();
    due.sort_by_key(|t| t.proficiency);
    due
}

/// Fetch progress and compute the due list.
pub async fn load_due_topics(backend: &dyn ProgressBackend, today: NaiveDate) -> Result<Vec<DueTopic>> {
    let progress = backend.topic_progress().await?;
    Ok(due_topics(&progress, today))
}

/// Mark a topic reviewed, then record the activity.  The activity call is
/// best-effort.
pub async fn mark_reviewed(backend: &dyn ProgressBackend, topic_code: &str) -> Result<()> {
    backend.mark_topic_reviewed(topic_code).await?;
    if let Err(e) = backend.track_activity(TrackActivityRequest::page_view()).await {
        tracing::warn!(topic_code, error = %e, "activity tracking after review failed");
    }
    Ok(())
}
