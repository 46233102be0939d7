//! Exam countdown.

use chrono::NaiveDate;
use tutor_domain::config::{ExamDate, ProgressConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownUrgency {
    Normal,
    Medium,
    High,
}

impl CountdownUrgency {
    pub fn for_days_remaining(days: i64) -> Self {
        if days <= 7 {
            CountdownUrgency::High
        } else if days <= 30 {
            CountdownUrgency::Medium
        } else {
            CountdownUrgency::Normal
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CountdownUrgency::Normal => "normal",
            CountdownUrgency::Medium => "medium",
            CountdownUrgency::High => "high",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Countdown {
    pub name: String,
    pub date: NaiveDate,
    /// Whole days from the start of today; negative once the exam is past.
    pub days_remaining: i64,
    /// Share of the preparation window already elapsed, 0 to 100.
    pub percent_elapsed: f64,
    pub urgency: CountdownUrgency,
}

impl Countdown {
    pub fn compute(exam: &ExamDate, today: NaiveDate, prep_days: u32) -> Self {
        let days_remaining = (exam.date - today).num_days();
        let window = f64::from(prep_days.max(1));
        let percent_elapsed = (100.0 - days_remaining as f64 / window * 100.0).clamp(0.0, 100.0);
        Self {
            name: exam.name.clone(),
            date: exam.date,
            days_remaining,
            percent_elapsed,
            urgency: CountdownUrgency::for_days_remaining(days_remaining),
        }
    }

    /// e.g. `11 June 2025`.
    pub fn date_label(&self) -> String {
        self.date.format("%-d %B %Y").to_string()
    }
}

/// One countdown per configured exam, in configuration order.
pub fn countdowns(config: &ProgressConfig, today: NaiveDate) -> Vec<Countdown> {
    config
        .exams
        .iter()
        .map(|exam| Countdown::compute(exam, today, config.prep_days))
        .collect()
}
