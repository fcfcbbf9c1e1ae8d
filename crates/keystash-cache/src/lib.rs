//! Function-result caching for keystash.
//!
//! Reads go through a [`CacheRouter`] route: the result of the wrapped call is
//! stored under `<prefix>-<key_id>` and the key id is appended to the
//! prefix's revocation list. Writes go through [`RevokeAll`], which deletes
//! every recorded entry under the prefix before mutating.
//!
//! The backend is either Redis ([`RedisClient`]), the in-process
//! [`FallbackStore`], or nothing at all, in which case calls pass straight
//! through to the wrapped function.

pub mod client;
pub mod config;
pub mod error;
pub mod memory;
pub mod redis;
pub mod resolver;
pub mod revocation;
pub mod revoke;
pub mod router;
pub mod sentinel;

pub use client::{CacheClient, SharedClient};
pub use config::CacheSettings;
pub use error::{CacheError, CacheResult};
pub use memory::{CacheEntry, FallbackStore};
pub use crate::redis::{RedisClient, redact_url};
pub use resolver::BackendResolver;
pub use revocation::{RevocationList, check_key_id, prefixed_key, revocation_key};
pub use revoke::RevokeAll;
pub use router::{CacheRouter, CallArgs, Route};
pub use sentinel::{ABSENT, Lookup};
