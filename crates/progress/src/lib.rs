//! `tutor-progress`: the study-progress widgets.
//!
//! Each module is a pure view model over data fetched through
//! [`ProgressBackend`](tutor_backend::ProgressBackend), plus the thin async
//! operation that fetches or submits it:
//!
//! - [`activity`] -- month calendar of study activity and the streak badge
//! - [`spaced`] -- spaced-repetition due list
//! - [`countdown`] -- days remaining to each configured exam
//! - [`forms`] -- rate-topic and record-exam submission with validation
//! - [`notes`] -- topic code to notes-PDF lookup
//! - [`exam_pdf`] -- exam-paper PDF generation

pub mod activity;
pub mod countdown;
pub mod exam_pdf;
pub mod forms;
pub mod notes;
pub mod spaced;

pub use activity::{CalendarCell, MonthCalendar, StreakBadge, YearMonth};
pub use countdown::{Countdown, CountdownUrgency};
pub use forms::{EXAM_RECORDED, RATING_SAVED};
pub use notes::NotesRef;
pub use spaced::{DueTopic, Urgency};
