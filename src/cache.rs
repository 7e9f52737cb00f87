// SPDX-License-Identifier: Apache-2.0

//! Time-boxed storage for the accumulated record set.
//!
//! One well-known slot holds the records of the last scan pass; while the
//! entry is unexpired a read returns exactly what was written, the set an
//! incremental refresh extends. An expired entry reads as a miss, which is
//! what sends the next open back to a full scan.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::record::LogRecord;

/// The single ingestion slot shared by all consumers of a process
pub const LOGS_CACHE_KEY: &str = "logdeck.logs";

#[derive(Debug)]
struct CacheEntry {
    records: Vec<LogRecord>,
    expires_at: Instant,
}

/// Key -> record-list store with wall-clock TTL expiry measured from the
/// last put.
#[derive(Debug, Default)]
pub struct RecordCache {
    entries: HashMap<String, CacheEntry>,
}

impl RecordCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the records under `key`; `None` when absent or expired
    pub fn get(&self, key: &str) -> Option<&[LogRecord]> {
        let entry = self.entries.get(key)?;
        if Instant::now() >= entry.expires_at {
            return None;
        }
        Some(&entry.records)
    }

    /// Store `records` under `key`, valid for `ttl` from now
    pub fn put(&mut self, key: &str, records: Vec<LogRecord>, ttl: Duration) {
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                records,
                expires_at: Instant::now() + ttl,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: u64) -> LogRecord {
        LogRecord::warning(id, format!("record {}", id))
    }

    #[test]
    fn test_get_returns_what_was_put() {
        let mut cache = RecordCache::new();
        cache.put(LOGS_CACHE_KEY, vec![record(1), record(2)], Duration::from_secs(60));

        let records = cache.get(LOGS_CACHE_KEY).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, 1);
        assert_eq!(records[1].id, 2);
    }

    #[test]
    fn test_absent_key_is_a_miss() {
        let cache = RecordCache::new();
        assert!(cache.get(LOGS_CACHE_KEY).is_none());
    }

    #[test]
    fn test_expired_entry_is_a_miss() {
        let mut cache = RecordCache::new();
        cache.put(LOGS_CACHE_KEY, vec![record(1)], Duration::ZERO);

        assert!(cache.get(LOGS_CACHE_KEY).is_none());
    }

    #[test]
    fn test_put_refreshes_expiry_and_contents() {
        let mut cache = RecordCache::new();
        cache.put(LOGS_CACHE_KEY, vec![record(1)], Duration::ZERO);
        cache.put(LOGS_CACHE_KEY, vec![record(1), record(2)], Duration::from_secs(60));

        assert_eq!(cache.get(LOGS_CACHE_KEY).unwrap().len(), 2);
    }
}
