use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::NaiveDate;

use crate::topic::Mode;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub progress: ProgressConfig,
    #[serde(default)]
    pub notes: NotesConfig,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Backend connection
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "d_base_url")]
    pub base_url: String,
    /// Timeout for plain request/response calls.
    #[serde(default = "d_15000")]
    pub timeout_ms: u64,
    /// Maximum silence on an open event stream before it counts as a
    /// transport error.
    #[serde(default = "d_120000")]
    pub stream_idle_timeout_ms: u64,
    /// Environment variable holding a bearer token for the backend.
    #[serde(default = "d_token_env")]
    pub api_token_env: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: d_base_url(),
            timeout_ms: 15_000,
            stream_idle_timeout_ms: 120_000,
            api_token_env: d_token_env(),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Chat controller
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Maximum retained history entries; oldest are dropped past this.
    #[serde(default = "d_20")]
    pub max_history: usize,
    #[serde(default)]
    pub default_mode: Mode,
    /// Text shown in the placeholder while a turn is generating.
    #[serde(default = "d_thinking")]
    pub thinking_text: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_history: 20,
            default_mode: Mode::Explore,
            thinking_text: d_thinking(),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Local storage
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "d_state_path")]
    pub state_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_path: d_state_path(),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Progress widgets
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressConfig {
    #[serde(default = "d_exams")]
    pub exams: Vec<ExamDate>,
    /// Length of the preparation window the countdown ring is drawn over.
    #[serde(default = "d_100")]
    pub prep_days: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamDate {
    pub name: String,
    pub date: NaiveDate,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            exams: d_exams(),
            prep_days: 100,
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Notes (PDF viewer)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotesConfig {
    /// URL path prefix the PDF files are served under.
    #[serde(default = "d_resources")]
    pub resources_path: String,
    /// Topic code (or `"default"`) to PDF reference.
    #[serde(default)]
    pub pdfs: BTreeMap<String, PdfRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdfRef {
    pub file: String,
    #[serde(default = "d_page")]
    pub page: u32,
}

impl Default for NotesConfig {
    fn default() -> Self {
        Self {
            resources_path: d_resources(),
            pdfs: BTreeMap::new(),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Defaults
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

fn d_base_url() -> String {
    "http://127.0.0.1:5000".into()
}
fn d_token_env() -> String {
    "TUTOR_API_TOKEN".into()
}
fn d_thinking() -> String {
    "Thinking...".into()
}
fn d_state_path() -> PathBuf {
    PathBuf::from("./data/state")
}
fn d_resources() -> String {
    "/resources".into()
}
fn d_exams() -> Vec<ExamDate> {
    [("Paper 1", (2025, 6, 11)), ("Paper 2", (2025, 6, 18))]
        .into_iter()
        .filter_map(|(name, (y, m, d))| {
            NaiveDate::from_ymd_opt(y, m, d).map(|date| ExamDate {
                name: name.into(),
                date,
            })
        })
        .collect()
}
fn d_15000() -> u64 {
    15_000
}
fn d_120000() -> u64 {
    120_000
}
fn d_20() -> usize {
    20
}
fn d_100() -> u32 {
    100
}
fn d_page() -> u32 {
    1
}
