use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::storage::KeyValueStore;

/// Store key under which the serialized log lives.
pub const HISTORY_STORE_KEY: &str = "minutes-history";

/// One finished transcript entry. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub text: String,
    /// Localized wall-clock label ("HH:MM") captured at the cut.
    pub time: String,
}

/// Wall-clock label for a new entry.
pub fn local_time_label() -> String {
    chrono::Local::now().format("%H:%M").to_string()
}

/// Append-only ordered log of finished entries, persisted on every change.
///
/// Insertion order equals the chronological order of cuts. The log is saved
/// to the store as opaque JSON; a corrupt or unreadable payload is logged and
/// treated as an empty history rather than blocking recording.
pub struct HistoryLog {
    entries: Vec<HistoryEntry>,
    store: Box<dyn KeyValueStore>,
    key: String,
}

impl HistoryLog {
    /// Load the persisted log under `key`, or start empty.
    pub fn load_or_default(store: Box<dyn KeyValueStore>, key: impl Into<String>) -> Result<Self> {
        let key = key.into();
        let entries = match store.load(&key)? {
            Some(json) => match serde_json::from_str::<Vec<HistoryEntry>>(&json) {
                Ok(entries) => {
                    info!("Loaded {} history entries", entries.len());
                    entries
                }
                Err(e) => {
                    warn!("Discarding unreadable history payload: {}", e);
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        Ok(Self {
            entries,
            store,
            key,
        })
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append a finished entry and persist the log.
    ///
    /// The entry is retained in memory even if persistence fails, so a
    /// transient storage error never drops transcript text.
    pub fn append(&mut self, text: String, time: String) -> Result<()> {
        self.entries.push(HistoryEntry { text, time });
        self.persist()
    }

    /// Drop all entries and persist the empty log.
    pub fn clear(&mut self) -> Result<()> {
        self.entries.clear();
        self.persist()
    }

    /// Plain-text rendering: one `[HH:MM] text` paragraph per entry.
    pub fn render_plain(&self) -> String {
        self.entries
            .iter()
            .map(|e| format!("[{}] {}", e.time, e.text))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    fn persist(&self) -> Result<()> {
        let json = serde_json::to_string(&self.entries).context("Failed to serialize history")?;
        self.store
            .save(&self.key, &json)
            .context("Failed to persist history")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn empty_log() -> HistoryLog {
        HistoryLog::load_or_default(Box::new(MemoryStore::new()), HISTORY_STORE_KEY).unwrap()
    }

    #[test]
    fn append_preserves_order() -> Result<()> {
        let mut log = empty_log();
        log.append("first".into(), "09:00".into())?;
        log.append("second".into(), "09:05".into())?;

        let texts: Vec<_> = log.entries().iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second"]);
        Ok(())
    }

    #[test]
    fn render_plain_formats_entries() -> Result<()> {
        let mut log = empty_log();
        log.append("おはようございます。".into(), "09:00".into())?;
        log.append("始めましょう。".into(), "09:05".into())?;

        assert_eq!(
            log.render_plain(),
            "[09:00] おはようございます。\n\n[09:05] 始めましょう。"
        );
        Ok(())
    }

    #[test]
    fn corrupt_payload_starts_empty() -> Result<()> {
        let store = MemoryStore::new();
        store.save(HISTORY_STORE_KEY, "not json")?;

        let log = HistoryLog::load_or_default(Box::new(store), HISTORY_STORE_KEY)?;
        assert!(log.is_empty());
        Ok(())
    }
}
