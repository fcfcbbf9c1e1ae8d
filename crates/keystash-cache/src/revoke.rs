//! Revoke-before-write wrapper for mutations.

use std::future::Future;

use crate::error::CacheError;
use crate::router::CacheRouter;

/// Runs a mutation after revoking every cached entry under one prefix.
///
/// Revocation happens first and unconditionally, so a reader can never
/// repopulate the cache with pre-mutation state after the write lands. A
/// mutation that then fails has still invalidated the prefix.
#[derive(Debug, Clone)]
pub struct RevokeAll {
    router: CacheRouter,
    prefix: String,
}

impl RevokeAll {
    pub(crate) fn new(router: CacheRouter, prefix: String) -> Self {
        Self { router, prefix }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Revoke, then run `f`. A revocation error aborts before `f` runs.
    pub async fn call<T, E, F, Fut>(&self, f: F) -> Result<T, E>
    where
        E: From<CacheError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let revoked = self.router.revoke(&self.prefix).await?;
        if revoked > 0 {
            tracing::debug!(prefix = %self.prefix, revoked, "revoked before mutation");
        }
        f().await
    }
}
