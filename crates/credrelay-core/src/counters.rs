// ── Daily usage counters ──
//
// One record per calendar day under `remote-rest-user-requests-YYYY-MM-DD`,
// mapping `total` (relay attempts) and each remote site name (successful
// probes) to a count. Every write pushes the record's expiry out to
// `retention` from now.

use std::sync::Arc;

use chrono::{Days, Duration, NaiveDate};
use tracing::trace;

use crate::clock::Clock;
use crate::error::CoreError;
use crate::store::{CounterRecord, CounterStore, DailyCounts};

pub const COUNTER_KEY_PREFIX: &str = "remote-rest-user-requests-";

/// Counter name for relay attempts.
pub const TOTAL: &str = "total";

pub const DEFAULT_RETENTION_DAYS: u32 = 7;

/// Store key for one day's counters.
pub fn counter_key(day: NaiveDate) -> String {
    format!("{COUNTER_KEY_PREFIX}{}", day.format("%Y-%m-%d"))
}

pub struct UsageCounters {
    store: Arc<dyn CounterStore>,
    clock: Arc<dyn Clock>,
    retention: Duration,
}

impl UsageCounters {
    pub fn new(store: Arc<dyn CounterStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            retention: Duration::days(DEFAULT_RETENTION_DAYS.into()),
        }
    }

    #[must_use]
    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    pub fn retention(&self) -> Duration {
        self.retention
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Count one relay attempt on `day`.
    pub fn record_attempt(&self, day: NaiveDate) -> Result<u64, CoreError> {
        self.bump(day, TOTAL)
    }

    /// Count one successful probe against `site` on `day`.
    pub fn record_success(&self, day: NaiveDate, site: &str) -> Result<u64, CoreError> {
        self.bump(day, site)
    }

    /// The live counters for `day`, if any were recorded.
    pub fn get(&self, day: NaiveDate) -> Result<Option<DailyCounts>, CoreError> {
        Ok(self.store.load(&counter_key(day), self.clock.now())?)
    }

    /// Days with counters, walking backward from today.
    ///
    /// Keeps going while days have records or fewer than `min_days` days
    /// have been checked, and never checks more than `max_days` days. Today
    /// is always checked.
    pub fn read_range(&self, min_days: u32, max_days: u32) -> StatsRange<'_> {
        StatsRange {
            counters: self,
            today: self.clock.today(),
            checked: 0,
            min_days,
            max_days: max_days.max(1),
            done: false,
        }
    }

    fn bump(&self, day: NaiveDate, name: &str) -> Result<u64, CoreError> {
        let key = counter_key(day);
        let now = self.clock.now();

        let mut counts = self.store.load(&key, now)?.unwrap_or_default();
        counts.entry(TOTAL.to_owned()).or_insert(0);
        let count = counts.entry(name.to_owned()).or_insert(0);
        *count += 1;
        let count = *count;

        self.store.save(
            &key,
            CounterRecord {
                counts,
                expires_at: now + self.retention,
            },
            now,
        )?;
        trace!(key = %key, counter = name, count, "usage counter incremented");
        Ok(count)
    }
}

impl std::fmt::Debug for UsageCounters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UsageCounters")
            .field("retention", &self.retention)
            .finish_non_exhaustive()
    }
}

// ── StatsRange ──────────────────────────────────────────────────────

/// Lazy backward walk over daily counters. Stops after the first error.
pub struct StatsRange<'a> {
    counters: &'a UsageCounters,
    today: NaiveDate,
    checked: u32,
    min_days: u32,
    max_days: u32,
    done: bool,
}

impl Iterator for StatsRange<'_> {
    type Item = Result<(NaiveDate, DailyCounts), CoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            if self.checked >= self.max_days {
                self.done = true;
                break;
            }
            let Some(day) = self.today.checked_sub_days(Days::new(self.checked.into())) else {
                self.done = true;
                break;
            };
            self.checked += 1;

            match self.counters.get(day) {
                Ok(Some(counts)) => return Some(Ok((day, counts))),
                Ok(None) => {
                    if self.checked >= self.min_days {
                        self.done = true;
                    }
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
        None
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::clock::FixedClock;
    use crate::store::MemoryStore;

    fn setup() -> (Arc<MemoryStore>, Arc<FixedClock>, UsageCounters) {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2024, 5, 15, 12, 0, 0).unwrap(),
        ));
        let counters = UsageCounters::new(store.clone(), clock.clone());
        (store, clock, counters)
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn key_format() {
        assert_eq!(
            counter_key(day(2024, 1, 9)),
            "remote-rest-user-requests-2024-01-09"
        );
    }

    #[test]
    fn attempts_and_successes_count_independently() {
        let (store, _clock, counters) = setup();
        let today = day(2024, 5, 15);

        assert_eq!(counters.record_attempt(today).unwrap(), 1);
        assert_eq!(counters.record_attempt(today).unwrap(), 2);
        assert_eq!(counters.record_success(today, "example.com").unwrap(), 1);

        let counts = counters.get(today).unwrap().unwrap();
        assert_eq!(counts.get(TOTAL), Some(&2));
        assert_eq!(counts.get("example.com"), Some(&1));
        assert_eq!(
            store.counter_keys(),
            vec!["remote-rest-user-requests-2024-05-15".to_owned()]
        );
    }

    #[test]
    fn expiry_slides_with_each_write() {
        let (store, clock, counters) = setup();
        let today = day(2024, 5, 15);

        counters.record_attempt(today).unwrap();
        clock.advance(Duration::days(5));
        counters.record_attempt(today).unwrap();

        let record = store.counter_record(&counter_key(today)).unwrap();
        assert_eq!(
            record.expires_at,
            Utc.with_ymd_and_hms(2024, 5, 27, 12, 0, 0).unwrap()
        );

        clock.advance(Duration::days(7));
        assert_eq!(counters.get(today).unwrap(), None);
    }

    #[test]
    fn read_range_checks_at_least_min_days() {
        let (_store, _clock, counters) = setup();
        counters.record_attempt(day(2024, 5, 15)).unwrap();
        counters.record_attempt(day(2024, 5, 10)).unwrap();
        counters.record_attempt(day(2024, 5, 1)).unwrap();

        let days: Vec<NaiveDate> = counters
            .read_range(7, 366)
            .map(|r| r.unwrap().0)
            .collect();
        // 2024-05-01 is beyond the seven-day window with a gap before it.
        assert_eq!(days, vec![day(2024, 5, 15), day(2024, 5, 10)]);
    }

    #[test]
    fn read_range_follows_consecutive_days_past_minimum() {
        let (_store, _clock, counters) = setup();
        for d in 5..=15 {
            counters.record_attempt(day(2024, 5, d)).unwrap();
        }

        let found = counters.read_range(2, 366).count();
        assert_eq!(found, 11);

        let capped = counters.read_range(2, 4).count();
        assert_eq!(capped, 4);
    }

    #[test]
    fn read_range_with_nothing_recorded() {
        let (_store, _clock, counters) = setup();
        assert_eq!(counters.read_range(7, 366).count(), 0);
        assert_eq!(counters.read_range(0, 0).count(), 0);
    }
}
