// ── JSON state file ──
//
// Settings and counters live in one small JSON document. Every operation
// is read-modify-write under a process-local mutex; the file is replaced
// atomically via a sibling temp file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{CounterRecord, CounterStore, DailyCounts, SettingsStore, StoreError};

#[derive(Debug, Default, Serialize, Deserialize)]
struct StateDocument {
    #[serde(default)]
    settings: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    counters: BTreeMap<String, CounterRecord>,
}

/// File-backed settings and counter store.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<StateDocument, StoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) if contents.trim().is_empty() => Ok(StateDocument::default()),
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(StateDocument::default()),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, doc: &StateDocument) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_string_pretty(doc)?)?;
        std::fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), "state file written");
        Ok(())
    }
}

impl SettingsStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<serde_json::Value>, StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.read()?.settings.remove(key))
    }

    fn put(&self, key: &str, value: serde_json::Value) -> Result<(), StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut doc = self.read()?;
        doc.settings.insert(key.to_owned(), value);
        self.write(&doc)
    }
}

impl CounterStore for FileStore {
    fn load(&self, key: &str, now: DateTime<Utc>) -> Result<Option<DailyCounts>, StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self
            .read()?
            .counters
            .remove(key)
            .filter(|r| r.is_live(now))
            .map(|r| r.counts))
    }

    fn save(&self, key: &str, record: CounterRecord, now: DateTime<Utc>) -> Result<(), StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut doc = self.read()?;
        doc.counters.retain(|_, r| r.is_live(now));
        doc.counters.insert(key.to_owned(), record);
        self.write(&doc)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    use super::*;

    #[test]
    fn missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("state.json"));
        assert_eq!(store.get("anything").unwrap(), None);
        assert_eq!(store.load("anything", Utc::now()).unwrap(), None);
    }

    #[test]
    fn settings_and_counters_share_one_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");
        let now = Utc.with_ymd_and_hms(2024, 5, 15, 9, 30, 0).unwrap();

        let store = FileStore::new(&path);
        store.put("sites", json!(["example.com"])).unwrap();
        store
            .save(
                "remote-rest-user-requests-2024-05-15",
                CounterRecord {
                    counts: DailyCounts::from([("total".to_owned(), 2)]),
                    expires_at: now + Duration::days(7),
                },
                now,
            )
            .unwrap();

        // A second handle sees the same state.
        let reopened = FileStore::new(&path);
        assert_eq!(reopened.get("sites").unwrap(), Some(json!(["example.com"])));
        let counts = reopened
            .load("remote-rest-user-requests-2024-05-15", now)
            .unwrap()
            .unwrap();
        assert_eq!(counts.get("total"), Some(&2));
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{not json").unwrap();
        let store = FileStore::new(&path);
        assert!(matches!(store.get("sites"), Err(StoreError::Serialization(_))));
    }
}
