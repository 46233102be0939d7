//! Durable client-local key-value store.
//!
//! Persists to `local_storage.json` under the configured state path and
//! writes through on every mutation, so a value is on disk as soon as the
//! setter returns `Ok`.  Persistence is best-effort: a failed write keeps
//! the in-memory value and returns the error for the caller to log.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde_json::Value;

use tutor_domain::error::{Error, Result};

use crate::session_key::{session_storage_key, CHAT_COLLAPSED_KEY, PANEL_DOCKED_KEY};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Local store
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct LocalStore {
    path: Option<PathBuf>,
    entries: RwLock<BTreeMap<String, Value>>,
}

impl LocalStore {
    /// Load or create the store at `state_path/local_storage.json`.
    ///
    /// A malformed file is treated as empty (and overwritten on the next
    /// write) rather than failing startup.
    pub fn open(state_path: &Path) -> Result<Self> {
        std::fs::create_dir_all(state_path).map_err(Error::Io)?;

        let path = state_path.join("local_storage.json");
        let entries = if path.exists() {
            let raw = std::fs::read_to_string(&path).map_err(Error::Io)?;
            match serde_json::from_str(&raw) {
                Ok(map) => map,
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "local storage file is malformed; starting empty"
                    );
                    BTreeMap::new()
                }
            }
        } else {
            BTreeMap::new()
        };

        tracing::debug!(
            keys = entries.len(),
            path = %path.display(),
            "local storage loaded"
        );

        Ok(Self {
            path: Some(path),
            entries: RwLock::new(entries),
        })
    }

    /// A store that never touches disk.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            entries: RwLock::new(BTreeMap::new()),
        }
    }

    // ── raw access ───────────────────────────────────────────────────

    pub fn get_str(&self, key: &str) -> Option<String> {
        self.entries
            .read()
            .get(key)
            .and_then(|v| v.as_str())
            .map(str::to_owned)
    }

    /// Booleans are also accepted in their string form (`"true"`), which
    /// is how browser storage hands them back.
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.entries.read().get(key)? {
            Value::Bool(b) => Some(*b),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    pub fn set(&self, key: &str, value: Value) -> Result<()> {
        self.entries.write().insert(key.to_owned(), value);
        self.flush()
    }

    pub fn remove(&self, key: &str) -> Result<()> {
        let removed = self.entries.write().remove(key).is_some();
        if removed {
            self.flush()?;
        }
        Ok(())
    }

    pub fn keys(&self) -> Vec<String> {
        self.entries.read().keys().cloned().collect()
    }

    /// Persist the current contents to disk.
    pub fn flush(&self) -> Result<()> {
        let Some(ref path) = self.path else {
            return Ok(());
        };
        let json = {
            let entries = self.entries.read();
            serde_json::to_string_pretty(&*entries)
                .map_err(|e| Error::Other(format!("serializing local storage: {e}")))?
        };
        std::fs::write(path, json).map_err(Error::Io)
    }

    // ── typed helpers ────────────────────────────────────────────────

    /// The persisted session ID for a topic, if any.
    pub fn session_id(&self, topic_code: &str) -> Option<String> {
        self.get_str(&session_storage_key(topic_code))
            .filter(|id| !id.is_empty())
    }

    pub fn set_session_id(&self, topic_code: &str, session_id: &str) -> Result<()> {
        self.set(
            &session_storage_key(topic_code),
            Value::String(session_id.to_owned()),
        )
    }

    pub fn clear_session_id(&self, topic_code: &str) -> Result<()> {
        self.remove(&session_storage_key(topic_code))
    }

    /// Whether the notes panel is docked.  Only an explicit `false`
    /// undocks it.
    pub fn panel_docked(&self) -> bool {
        self.get_bool(PANEL_DOCKED_KEY).unwrap_or(true)
    }

    pub fn set_panel_docked(&self, docked: bool) -> Result<()> {
        self.set(PANEL_DOCKED_KEY, Value::Bool(docked))
    }

    pub fn chat_collapsed(&self) -> bool {
        self.get_bool(CHAT_COLLAPSED_KEY).unwrap_or(false)
    }

    /// Flip the collapsed state and return the new value.
    pub fn toggle_chat_collapsed(&self) -> Result<bool> {
        let collapsed = !self.chat_collapsed();
        self.set(CHAT_COLLAPSED_KEY, Value::Bool(collapsed))?;
        Ok(collapsed)
    }
}
