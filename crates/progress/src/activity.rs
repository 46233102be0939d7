//! Study activity calendar and streak badge.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use tutor_backend::{ActivityData, ActivityDay, ProgressBackend, TrackActivityRequest};
use tutor_domain::error::{Error, Result};

pub const STREAK_AT_RISK: &str = "Study today to keep your streak!";

/// Highest activity level a cell can show.
pub const MAX_LEVEL: u8 = 4;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Month navigation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A calendar month.  `month` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(Error::Validation(format!("month out of range: {month}")));
        }
        Ok(Self { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn prev(self) -> Self {
        if self.month == 1 {
            Self { year: self.year - 1, month: 12 }
        } else {
            Self { month: self.month - 1, ..self }
        }
    }

    pub fn next(self) -> Self {
        if self.month == 12 {
            Self { year: self.year + 1, month: 1 }
        } else {
            Self { month: self.month + 1, ..self }
        }
    }

    pub fn first_day(self) -> Result<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .ok_or_else(|| Error::Validation(format!("invalid month: {self}")))
    }

    pub fn days_in_month(self) -> Result<u32> {
        let first = self.first_day()?;
        let next = self.next().first_day()?;
        Ok((next - first).num_days() as u32)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = Error;

    /// Parses `YYYY-MM`.
    fn from_str(s: &str) -> Result<Self> {
        let bad = || Error::Validation(format!("expected YYYY-MM, got {s:?}"));
        let (y, m) = s.trim().split_once('-').ok_or_else(bad)?;
        let year = y.parse().map_err(|_| bad())?;
        let month = m.parse().map_err(|_| bad())?;
        Self::new(year, month)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Calendar model
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarCell {
    pub date: NaiveDate,
    /// 0 (no activity) to [`MAX_LEVEL`].
    pub level: u8,
    pub today: bool,
}

/// One month laid out Sunday-first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthCalendar {
    pub month: YearMonth,
    /// Empty cells before the 1st, so that day 1 sits under its weekday.
    pub leading_blanks: u32,
    pub cells: Vec<CalendarCell>,
}

impl MonthCalendar {
    pub fn build(month: YearMonth, activity: &[ActivityDay], today: NaiveDate) -> Result<Self> {
        let first = month.first_day()?;
        let leading_blanks = first.weekday().num_days_from_sunday();

        let cells = first
            .iter_days()
            .take(month.days_in_month()? as usize)
            .map(|date| CalendarCell {
                date,
                level: level_on(activity, date),
                today: date == today,
            })
            .collect();

        Ok(Self {
            month,
            leading_blanks,
            cells,
        })
    }

    /// Cells grouped into Sunday-first weeks; `None` marks a blank.
    pub fn weeks(&self) -> Vec<Vec<Option<&CalendarCell>>> {
        let padded: Vec<Option<&CalendarCell>> = std::iter::repeat(None)
            .take(self.leading_blanks as usize)
            .chain(self.cells.iter().map(Some))
            .collect();
        padded.chunks(7).map(|w| w.to_vec()).collect()
    }
}

fn level_on(activity: &[ActivityDay], date: NaiveDate) -> u8 {
    activity
        .iter()
        .find(|d| NaiveDate::parse_from_str(&d.date, "%Y-%m-%d").ok() == Some(date))
        .map_or(0, |d| d.level.min(MAX_LEVEL))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Streak
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreakBadge {
    pub streak: u32,
    pub at_risk: bool,
}

impl StreakBadge {
    pub fn label(&self) -> String {
        format!("{}-day streak", self.streak)
    }

    pub fn warning(&self) -> Option<&'static str> {
        self.at_risk.then_some(STREAK_AT_RISK)
    }
}

impl From<&ActivityData> for StreakBadge {
    fn from(data: &ActivityData) -> Self {
        Self {
            streak: data.current_streak,
            at_risk: data.streak_at_risk,
        }
    }
}

/// Record a page view.  Returns a badge only when the backend reported
/// both a non-zero streak and an at-risk flag.
pub async fn track_page_view(backend: &dyn ProgressBackend) -> Result<Option<StreakBadge>> {
    let update = backend.track_activity(TrackActivityRequest::page_view()).await?;
    if let Some(error) = update.error {
        tracing::warn!(error = %error, "track-activity reported an error");
        return Ok(None);
    }
    Ok(match (update.streak, update.streak_at_risk) {
        (Some(streak), Some(at_risk)) if streak > 0 => Some(StreakBadge { streak, at_risk }),
        _ => None,
    })
}

/// Fetch activity data and lay out `month`.
pub async fn load_calendar(
    backend: &dyn ProgressBackend,
    month: YearMonth,
    today: NaiveDate,
) -> Result<(MonthCalendar, StreakBadge)> {
    let data = backend.activity_data().await?;
    let calendar = MonthCalendar::build(month, &data.activity_data, today)?;
    Ok((calendar, StreakBadge::from(&data)))
}
