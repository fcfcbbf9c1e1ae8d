//! Selection of the active cache client.

use std::sync::{Arc, OnceLock};

use crate::client::SharedClient;
use crate::config::CacheSettings;
use crate::memory::FallbackStore;
use crate::redis::{RedisClient, redact_url};

/// Picks the client a router talks to.
///
/// An explicitly supplied client always wins, reachable or not. Otherwise the
/// choice is derived once from static settings and reused for the lifetime
/// of the resolver:
///
/// 1. `servers` set → [`RedisClient`]
/// 2. `in_memory_fallback` → a [`FallbackStore`] private to this resolver
/// 3. neither → no client, callers bypass caching
pub struct BackendResolver {
    explicit: Option<SharedClient>,
    settings: CacheSettings,
    resolved: OnceLock<Option<SharedClient>>,
}

impl std::fmt::Debug for BackendResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendResolver")
            .field("explicit", &self.explicit.as_ref().map(|c| c.name()))
            .field("settings", &self.settings)
            .finish()
    }
}

impl BackendResolver {
    pub fn new(settings: CacheSettings) -> Self {
        Self {
            explicit: None,
            settings,
            resolved: OnceLock::new(),
        }
    }

    /// Resolver that always returns `client`.
    pub fn with_client(client: SharedClient, settings: CacheSettings) -> Self {
        Self {
            explicit: Some(client),
            settings,
            resolved: OnceLock::new(),
        }
    }

    pub fn settings(&self) -> &CacheSettings {
        &self.settings
    }

    /// The active client, or `None` when caching is disabled.
    pub fn client(&self) -> Option<SharedClient> {
        if let Some(client) = &self.explicit {
            return Some(Arc::clone(client));
        }
        self.resolved.get_or_init(|| self.build()).clone()
    }

    fn build(&self) -> Option<SharedClient> {
        if let Some(addr) = self.settings.backend_address() {
            match self
                .settings
                .validate()
                .and_then(|()| RedisClient::from_settings(&self.settings))
            {
                Ok(client) => {
                    tracing::info!(url = %redact_url(addr), "Using Redis cache backend");
                    return Some(Arc::new(client));
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        "Failed to create cache client, ignoring cache.servers"
                    );
                }
            }
        }

        if self.settings.in_memory_fallback {
            tracing::info!("No external cache configured, using in-process fallback store");
            return Some(Arc::new(FallbackStore::new()));
        }

        tracing::info!("No cache backend configured, caching disabled");
        None
    }
}
