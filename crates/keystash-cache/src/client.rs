//! The cache client protocol.
//!
//! Both the external backend and the in-process [`FallbackStore`] implement
//! this trait, so the router never needs to know which one is active.
//!
//! [`FallbackStore`]: crate::memory::FallbackStore

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::CacheResult;

/// Memcached-style key/value protocol consumed by the cache router.
///
/// A `ttl` of [`Duration::ZERO`] means the entry never expires.
#[async_trait]
pub trait CacheClient: Send + Sync {
    /// Short backend name for logs ("memory", "redis").
    fn name(&self) -> &'static str;

    /// Fetch a value. Returns `None` when absent or expired.
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>>;

    /// Store a value unconditionally.
    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> CacheResult<bool>;

    /// Store a value only if the key is currently absent.
    async fn add(&self, key: &str, value: &[u8], ttl: Duration) -> CacheResult<bool>;

    /// Concatenate `suffix` onto an existing value.
    ///
    /// Returns `false` when the key does not exist. Backends without native
    /// append support keep this default and always report `false`.
    async fn append(&self, _key: &str, _suffix: &[u8]) -> CacheResult<bool> {
        Ok(false)
    }

    /// Add `delta` to an integer value, keeping its expiry.
    ///
    /// Returns `None` when the key does not exist.
    async fn incr(&self, key: &str, delta: i64) -> CacheResult<Option<i64>>;

    /// Remove a key. Deleting an absent key is not an error.
    async fn delete(&self, key: &str) -> CacheResult<()>;
}

/// Shareable handle to a cache client.
pub type SharedClient = Arc<dyn CacheClient>;
