//! In-process fallback store.
//!
//! Used when no external cache backend is configured. Expired entries are
//! evicted lazily: every `get` sweeps the whole map first, so there is no
//! background cleanup task. Fine for development and single-process
//! deployments, not meant as a production cache.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::client::CacheClient;
use crate::error::{CacheError, CacheResult};

/// A stored value with optional expiry.
#[derive(Clone, Debug)]
pub struct CacheEntry {
    /// `None` means the entry never expires.
    pub expire_at: Option<Instant>,
    pub value: Vec<u8>,
}

impl CacheEntry {
    fn new(value: Vec<u8>, ttl: Duration) -> Self {
        let expire_at = if ttl.is_zero() {
            None
        } else {
            Some(Instant::now() + ttl)
        };
        Self { expire_at, value }
    }

    /// Check if this entry has expired at `now`.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        self.expire_at.is_some_and(|at| now >= at)
    }
}

/// Thread-safe in-memory key/value store with per-entry expiry.
#[derive(Debug, Default)]
pub struct FallbackStore {
    entries: DashMap<String, CacheEntry>,
}

impl FallbackStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every expired entry. Returns the number of entries removed.
    pub fn evict_expired(&self) -> usize {
        let now = Instant::now();
        let mut removed = 0;

        self.entries.retain(|_, entry| {
            if entry.is_expired_at(now) {
                removed += 1;
                false
            } else {
                true
            }
        });

        if removed > 0 {
            tracing::trace!(removed, "evicted expired fallback entries");
        }
        removed
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.evict_expired();
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every entry.
    pub fn clear(&self) {
        self.entries.clear();
    }
}

#[async_trait]
impl CacheClient for FallbackStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        self.evict_expired();
        Ok(self.entries.get(key).map(|entry| entry.value.clone()))
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> CacheResult<bool> {
        self.entries
            .insert(key.to_string(), CacheEntry::new(value.to_vec(), ttl));
        Ok(true)
    }

    async fn add(&self, key: &str, value: &[u8], ttl: Duration) -> CacheResult<bool> {
        self.evict_expired();
        // The entry guard holds the shard lock, so check-and-insert is atomic.
        match self.entries.entry(key.to_string()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(CacheEntry::new(value.to_vec(), ttl));
                Ok(true)
            }
        }
    }

    async fn append(&self, key: &str, suffix: &[u8]) -> CacheResult<bool> {
        self.evict_expired();
        match self.entries.get_mut(key) {
            Some(mut entry) => {
                entry.value.extend_from_slice(suffix);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn incr(&self, key: &str, delta: i64) -> CacheResult<Option<i64>> {
        self.evict_expired();
        let Some(mut entry) = self.entries.get_mut(key) else {
            return Ok(None);
        };

        let current = std::str::from_utf8(&entry.value)
            .ok()
            .and_then(|s| s.trim().parse::<i64>().ok())
            .ok_or_else(|| CacheError::invalid_value(key, "value is not an integer"))?;
        let next = current
            .checked_add(delta)
            .ok_or_else(|| CacheError::invalid_value(key, "increment overflows"))?;

        // Expiry is left untouched.
        entry.value = next.to_string().into_bytes();
        Ok(Some(next))
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        self.entries.remove(key);
        Ok(())
    }
}
