// ── Persistence seams ──
//
// The relay persists two things: the remote-site list (a settings value)
// and the day-keyed usage counters (values with an expiry). Hosts plug in
// their own storage; `MemoryStore` and `FileStore` cover embedding, tests
// and the CLI.

pub mod file;
pub mod memory;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Counter name → count for one day. Always contains `total` once written.
pub type DailyCounts = BTreeMap<String, u64>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("corrupt value under '{key}': {reason}")]
    Corrupt { key: String, reason: String },
}

/// A persisted counter record and the instant it stops being visible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterRecord {
    pub counts: DailyCounts,
    pub expires_at: DateTime<Utc>,
}

impl CounterRecord {
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// Key/value settings storage (last write wins).
pub trait SettingsStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<serde_json::Value>, StoreError>;
    fn put(&self, key: &str, value: serde_json::Value) -> Result<(), StoreError>;
}

/// Expiring counter storage (last write wins).
///
/// `now` comes from the caller's clock so expiry is testable.
pub trait CounterStore: Send + Sync {
    /// The live record under `key`, if any.
    fn load(&self, key: &str, now: DateTime<Utc>) -> Result<Option<DailyCounts>, StoreError>;

    /// Replace the record under `key`. Stores may drop expired records
    /// while they are at it.
    fn save(&self, key: &str, record: CounterRecord, now: DateTime<Utc>) -> Result<(), StoreError>;
}
