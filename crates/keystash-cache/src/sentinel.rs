//! Encoding of cached values, including the "cached absence" marker.
//!
//! A wrapped call that legitimately returns nothing is stored as [`ABSENT`],
//! so a later read can tell "cached as nothing" apart from "never cached".
//! Real values are stored as JSON; the marker starts with a NUL byte and
//! can never be produced by the JSON encoder.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::CacheResult;

/// Stored form of a cached absence.
pub const ABSENT: &[u8] = b"\0keystash:absent";

/// Outcome of a cache read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    /// A cached value.
    Hit(T),
    /// The wrapped call was cached as returning nothing.
    HitAbsent,
    /// Never cached, expired, or revoked.
    Miss,
}

impl<T> Lookup<T> {
    pub fn is_hit(&self) -> bool {
        !self.is_miss()
    }

    pub fn is_miss(&self) -> bool {
        matches!(self, Self::Miss)
    }

    /// `None` on a miss, `Some(None)` for a cached absence.
    pub fn into_cached(self) -> Option<Option<T>> {
        match self {
            Self::Hit(value) => Some(Some(value)),
            Self::HitAbsent => Some(None),
            Self::Miss => None,
        }
    }
}

/// Encode a call result for storage.
pub fn encode<T: Serialize>(value: Option<&T>) -> CacheResult<Vec<u8>> {
    match value {
        Some(value) => Ok(serde_json::to_vec(value)?),
        None => Ok(ABSENT.to_vec()),
    }
}

/// Decode raw backend bytes. An empty value counts as a miss.
pub fn decode<T: DeserializeOwned>(raw: Option<&[u8]>) -> CacheResult<Lookup<T>> {
    match raw {
        None => Ok(Lookup::Miss),
        Some([]) => Ok(Lookup::Miss),
        Some(bytes) if bytes == ABSENT => Ok(Lookup::HitAbsent),
        Some(bytes) => Ok(Lookup::Hit(serde_json::from_slice(bytes)?)),
    }
}
