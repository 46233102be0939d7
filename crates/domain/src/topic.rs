use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// A curriculum unit: dot-delimited code (e.g. `"1.1.1"`) plus a human title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    pub code: String,
    pub title: String,
}

impl Topic {
    pub fn new(code: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            title: title.into(),
        }
    }

    /// The first `n` dot-separated segments of the code, re-joined.
    ///
    /// `Topic::new("1.1.1.a", "").code_prefix(2) == "1.1"`.
    pub fn code_prefix(&self, n: usize) -> String {
        code_prefix(&self.code, n)
    }
}

/// The first `n` dot-separated segments of `code`, re-joined.
pub fn code_prefix(code: &str, n: usize) -> String {
    code.split('.').take(n).collect::<Vec<_>>().join(".")
}

/// Pedagogical intent of a turn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Explore,
    Practice,
    Code,
    Review,
    Test,
}

impl Mode {
    pub const ALL: [Mode; 5] = [
        Mode::Explore,
        Mode::Practice,
        Mode::Code,
        Mode::Review,
        Mode::Test,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Explore => "explore",
            Mode::Practice => "practice",
            Mode::Code => "code",
            Mode::Review => "review",
            Mode::Test => "test",
        }
    }

    /// Parse a mode name, falling back to [`Mode::Explore`] for anything
    /// unrecognised.
    pub fn parse_lossy(s: &str) -> Mode {
        s.parse().unwrap_or_default()
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "explore" => Ok(Mode::Explore),
            "practice" => Ok(Mode::Practice),
            "code" => Ok(Mode::Code),
            "review" => Ok(Mode::Review),
            "test" => Ok(Mode::Test),
            other => Err(Error::Validation(format!("unknown mode: {other}"))),
        }
    }
}
