use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{CacheError, CacheResult};

/// Cache backend configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSettings {
    /// External backend address (e.g., "redis://localhost:6379").
    /// Unset disables the external backend.
    #[serde(default)]
    pub servers: Option<String>,

    /// Use an in-process store when no external backend is configured.
    /// Default: false (caching is bypassed entirely)
    #[serde(default)]
    pub in_memory_fallback: bool,

    /// Connection pool size for the external backend
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,

    /// Connection timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Abort a cached call when its key cannot be recorded for revocation.
    /// When false the failure is only logged.
    #[serde(default = "default_strict_revocation")]
    pub strict_revocation: bool,
}

fn default_pool_size() -> usize {
    10
}

fn default_timeout_ms() -> u64 {
    5000
}

fn default_strict_revocation() -> bool {
    true
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            servers: None,
            in_memory_fallback: false,
            pool_size: default_pool_size(),
            timeout_ms: default_timeout_ms(),
            strict_revocation: default_strict_revocation(),
        }
    }
}

impl CacheSettings {
    /// Settings pointing at a single external backend.
    pub fn with_servers(servers: impl Into<String>) -> Self {
        Self {
            servers: Some(servers.into()),
            ..Self::default()
        }
    }

    /// Settings using the in-process fallback store.
    pub fn in_memory() -> Self {
        Self {
            in_memory_fallback: true,
            ..Self::default()
        }
    }

    /// The configured backend address, ignoring blank values.
    pub fn backend_address(&self) -> Option<&str> {
        self.servers
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn validate(&self) -> CacheResult<()> {
        if self.backend_address().is_some_and(|addr| addr.contains(',')) {
            return Err(CacheError::configuration(
                "cache.servers must be a single address",
            ));
        }
        if self.pool_size == 0 {
            return Err(CacheError::configuration("cache.pool_size must be > 0"));
        }
        if self.timeout_ms == 0 {
            return Err(CacheError::configuration("cache.timeout_ms must be > 0"));
        }
        Ok(())
    }
}
