// ── In-memory store ──

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use dashmap::DashMap;

use super::{CounterRecord, CounterStore, DailyCounts, SettingsStore, StoreError};

/// Process-local settings and counters. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    settings: RwLock<HashMap<String, serde_json::Value>>,
    counters: DashMap<String, CounterRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw record, including expired ones. For inspection in tests.
    pub fn counter_record(&self, key: &str) -> Option<CounterRecord> {
        self.counters.get(key).map(|r| r.value().clone())
    }

    pub fn counter_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.counters.iter().map(|r| r.key().clone()).collect();
        keys.sort();
        keys
    }
}

impl SettingsStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<serde_json::Value>, StoreError> {
        let settings = self.settings.read().unwrap_or_else(PoisonError::into_inner);
        Ok(settings.get(key).cloned())
    }

    fn put(&self, key: &str, value: serde_json::Value) -> Result<(), StoreError> {
        let mut settings = self.settings.write().unwrap_or_else(PoisonError::into_inner);
        settings.insert(key.to_owned(), value);
        Ok(())
    }
}

impl CounterStore for MemoryStore {
    fn load(&self, key: &str, now: DateTime<Utc>) -> Result<Option<DailyCounts>, StoreError> {
        Ok(self
            .counters
            .get(key)
            .filter(|r| r.is_live(now))
            .map(|r| r.counts.clone()))
    }

    fn save(&self, key: &str, record: CounterRecord, now: DateTime<Utc>) -> Result<(), StoreError> {
        self.counters.retain(|_, r| r.is_live(now));
        self.counters.insert(key.to_owned(), record);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    use super::*;

    #[test]
    fn settings_last_write_wins() {
        let store = MemoryStore::new();
        assert_eq!(store.get("k").unwrap(), None);
        store.put("k", json!(["a"])).unwrap();
        store.put("k", json!(["b"])).unwrap();
        assert_eq!(store.get("k").unwrap(), Some(json!(["b"])));
    }

    #[test]
    fn expired_counters_are_invisible_and_purged() {
        let store = MemoryStore::new();
        let t0 = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let record = CounterRecord {
            counts: DailyCounts::from([("total".to_owned(), 3)]),
            expires_at: t0 + Duration::days(7),
        };
        store.save("old", record, t0).unwrap();

        assert!(store.load("old", t0 + Duration::days(6)).unwrap().is_some());
        assert!(store.load("old", t0 + Duration::days(7)).unwrap().is_none());

        let later = t0 + Duration::days(8);
        let fresh = CounterRecord {
            counts: DailyCounts::from([("total".to_owned(), 1)]),
            expires_at: later + Duration::days(7),
        };
        store.save("new", fresh, later).unwrap();
        assert_eq!(store.counter_keys(), vec!["new".to_owned()]);
    }
}
