//! Cache-aside memoization keyed by a named call argument.
//!
//! A [`CacheRouter`] is built once at startup and cloned into every service
//! that memoizes reads. Each memoized operation gets a [`Route`] naming the
//! argument that identifies the resource and the prefix its entries live
//! under:
//!
//! ```ignore
//! let route = router.route("delegation_id", "deleg").named("get_delegation");
//! let args = CallArgs::new().with("delegation_id", id);
//! let found = route
//!     .call(&args, |_| async move { driver.get(&id).await })
//!     .await?;
//! ```
//!
//! Writes are wrapped with [`CacheRouter::revoke_all`] so every entry under
//! the prefix is dropped before the mutation runs.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::client::{CacheClient, SharedClient};
use crate::config::CacheSettings;
use crate::error::{CacheError, CacheResult};
use crate::resolver::BackendResolver;
use crate::revocation::{RevocationList, check_key_id, prefixed_key};
use crate::revoke::RevokeAll;
use crate::sentinel::{self, Lookup};

const ANONYMOUS: &str = "<anonymous>";

/// Named arguments of a memoized call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallArgs {
    values: BTreeMap<String, String>,
}

impl CallArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl ToString) {
        self.values.insert(name.into(), value.to_string());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K, V> FromIterator<(K, V)> for CallArgs
where
    K: Into<String>,
    V: ToString,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut args = Self::new();
        for (name, value) in iter {
            args.insert(name, value);
        }
        args
    }
}

#[derive(Debug)]
struct RouterInner {
    resolver: BackendResolver,
    strict_revocation: bool,
}

/// Entry point for memoized reads and revoking writes.
#[derive(Debug, Clone)]
pub struct CacheRouter {
    inner: Arc<RouterInner>,
}

impl CacheRouter {
    /// Router whose backend is derived from `settings`.
    pub fn new(settings: CacheSettings) -> Self {
        Self::from_resolver(BackendResolver::new(settings))
    }

    /// Router bound to an explicit client, with default settings.
    pub fn with_client(client: SharedClient) -> Self {
        Self::from_resolver(BackendResolver::with_client(
            client,
            CacheSettings::default(),
        ))
    }

    /// Router that never caches.
    pub fn disabled() -> Self {
        Self::new(CacheSettings::default())
    }

    pub fn from_resolver(resolver: BackendResolver) -> Self {
        let strict_revocation = resolver.settings().strict_revocation;
        Self {
            inner: Arc::new(RouterInner {
                resolver,
                strict_revocation,
            }),
        }
    }

    /// The active client, or `None` when caching is bypassed.
    pub fn client(&self) -> Option<SharedClient> {
        self.inner.resolver.client()
    }

    pub fn is_enabled(&self) -> bool {
        self.client().is_some()
    }

    pub fn strict_revocation(&self) -> bool {
        self.inner.strict_revocation
    }

    /// Revocation list over the active client.
    pub fn revocations(&self) -> Option<RevocationList> {
        self.client().map(RevocationList::new)
    }

    /// Memoize calls keyed by the argument `key_arg` under `prefix`.
    pub fn route(&self, key_arg: impl Into<String>, prefix: impl Into<String>) -> Route {
        Route {
            router: self.clone(),
            key_arg: key_arg.into(),
            prefix: prefix.into(),
            name: ANONYMOUS.to_string(),
        }
    }

    /// Wrap a mutation so every entry under `prefix` is revoked first.
    pub fn revoke_all(&self, prefix: impl Into<String>) -> RevokeAll {
        RevokeAll::new(self.clone(), prefix.into())
    }

    /// Delete every entry recorded under `prefix`. No-op without a backend.
    pub async fn revoke(&self, prefix: &str) -> CacheResult<usize> {
        match self.revocations() {
            Some(list) => list.revoke(prefix).await,
            None => Ok(0),
        }
    }

    /// Read the cached entry for `key_id` under `prefix` without populating it.
    pub async fn lookup<T: DeserializeOwned>(
        &self,
        prefix: &str,
        key_id: &str,
    ) -> CacheResult<Lookup<T>> {
        let Some(client) = self.client() else {
            return Ok(Lookup::Miss);
        };
        let raw = client.get(&prefixed_key(prefix, key_id)).await?;
        sentinel::decode(raw.as_deref())
    }
}

/// A memoized operation. See [`CacheRouter::route`].
#[derive(Debug, Clone)]
pub struct Route {
    router: CacheRouter,
    key_arg: String,
    prefix: String,
    name: String,
}

impl Route {
    /// Name used in diagnostics for the wrapped operation.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn key_arg(&self) -> &str {
        &self.key_arg
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run `f` through the cache.
    ///
    /// On a hit `f` is not invoked. On a miss its result is stored, including
    /// `None`, and the key is recorded for revocation. Errors from `f` are
    /// returned untouched and nothing is cached. A key id that could not be
    /// revoked later (empty, or containing `,`) is rejected before the backend
    /// is touched.
    pub async fn call<T, E, F, Fut>(&self, args: &CallArgs, f: F) -> Result<Option<T>, E>
    where
        T: Serialize + DeserializeOwned,
        E: From<CacheError>,
        F: FnOnce(CallArgs) -> Fut,
        Fut: Future<Output = Result<Option<T>, E>>,
    {
        let key_id = args.get(&self.key_arg).ok_or_else(|| {
            CacheError::unexpected(format!(
                "There is no argument {} in function {}",
                self.key_arg, self.name
            ))
        })?;

        let Some(client) = self.router.client() else {
            return f(args.clone()).await;
        };
        check_key_id(key_id)?;

        let key = prefixed_key(&self.prefix, key_id);
        if let Some(cached) = self.read::<T>(client.as_ref(), &key).await?.into_cached() {
            tracing::debug!(key = %key, function = %self.name, "cache hit");
            return Ok(cached);
        }

        tracing::debug!(key = %key, function = %self.name, "cache miss");
        let result = f(args.clone()).await?;

        let encoded = sentinel::encode(result.as_ref())?;
        client.set(&key, &encoded, Duration::ZERO).await?;
        self.record(client, key_id).await?;

        Ok(result)
    }

    async fn read<T: DeserializeOwned>(
        &self,
        client: &dyn CacheClient,
        key: &str,
    ) -> CacheResult<Lookup<T>> {
        let raw = client.get(key).await?;
        match sentinel::decode(raw.as_deref()) {
            Ok(lookup) => Ok(lookup),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Failed to decode cached value, treating as miss");
                Ok(Lookup::Miss)
            }
        }
    }

    async fn record(&self, client: SharedClient, key_id: &str) -> CacheResult<()> {
        match RevocationList::new(client).record(&self.prefix, key_id).await {
            Ok(()) => Ok(()),
            Err(e) if self.router.strict_revocation() => Err(e),
            Err(e) => {
                tracing::warn!(
                    prefix = %self.prefix,
                    key_id = %key_id,
                    error = %e,
                    "Cached entry could not be recorded for revocation"
                );
                Ok(())
            }
        }
    }
}
