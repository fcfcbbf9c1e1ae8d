//! Per-prefix revocation lists.
//!
//! Every key cached under a prefix is recorded in a single backend entry,
//! `revocation_<prefix>`, holding the comma-joined key ids. A revoke-all reads
//! that entry and deletes `<prefix>-<id>` for each id. The list itself is
//! never shrunk; deleting an already-deleted key is a no-op.

use std::time::Duration;

use keystash_core::validate_id;

use crate::client::SharedClient;
use crate::error::{CacheError, CacheResult};

const REVOCATION_KEY: &str = "revocation";
const SEPARATOR: char = ',';

/// Backend key holding the revocation list for `prefix`.
pub fn revocation_key(prefix: &str) -> String {
    format!("{REVOCATION_KEY}_{prefix}")
}

/// Backend key of a cached entry.
pub fn prefixed_key(prefix: &str, key_id: &str) -> String {
    format!("{prefix}-{key_id}")
}

/// Reject key ids a revocation list cannot round-trip: empty ids and ids
/// containing the separator.
pub fn check_key_id(key_id: &str) -> CacheResult<()> {
    validate_id(key_id)
        .map_err(|e| CacheError::unexpected(format!("Invalid cache key id {key_id:?}: {e}")))
}

/// Revocation bookkeeping over a cache client.
#[derive(Clone)]
pub struct RevocationList {
    client: SharedClient,
}

impl RevocationList {
    pub fn new(client: SharedClient) -> Self {
        Self { client }
    }

    /// Make `key_id` discoverable by a later [`revoke`](Self::revoke).
    ///
    /// Tries, in order: append to an existing list, create the list, and
    /// append again in case another writer created it in between. The list is
    /// not linearizable, but every tier keeps the separator so concurrent
    /// writers cannot merge two ids.
    pub async fn record(&self, prefix: &str, key_id: &str) -> CacheResult<()> {
        check_key_id(key_id)?;
        let key = revocation_key(prefix);
        let entry = format!("{SEPARATOR}{key_id}");

        if self.client.append(&key, entry.as_bytes()).await? {
            return Ok(());
        }
        if self.client.add(&key, key_id.as_bytes(), Duration::ZERO).await? {
            tracing::debug!(prefix = %prefix, "created revocation list");
            return Ok(());
        }
        if self.client.append(&key, entry.as_bytes()).await? {
            tracing::debug!(prefix = %prefix, "revocation list created concurrently, appended");
            return Ok(());
        }

        Err(CacheError::unexpected("Unable to add token to revocation list"))
    }

    /// Key ids recorded for `prefix`, in insertion order. Duplicates are kept.
    pub async fn keys(&self, prefix: &str) -> CacheResult<Vec<String>> {
        let Some(raw) = self.client.get(&revocation_key(prefix)).await? else {
            return Ok(Vec::new());
        };
        Ok(String::from_utf8_lossy(&raw)
            .split(SEPARATOR)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// Delete every cached entry recorded for `prefix`.
    ///
    /// Returns the number of delete operations issued.
    pub async fn revoke(&self, prefix: &str) -> CacheResult<usize> {
        let ids = self.keys(prefix).await?;
        for id in &ids {
            self.client.delete(&prefixed_key(prefix, id)).await?;
        }
        tracing::debug!(prefix = %prefix, revoked = ids.len(), "revoked cached entries");
        Ok(ids.len())
    }
}
