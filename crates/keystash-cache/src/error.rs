//! Cache error types.

use keystash_core::{CoreError, ErrorCategory};
use thiserror::Error;

/// Errors raised by the caching layer.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Contract violation or unrecoverable bookkeeping failure.
    #[error("An unexpected error prevented the server from fulfilling your request: {message}")]
    Unexpected { message: String },

    /// Transient failure reported by the cache backend.
    #[error("Cache backend error: {message}")]
    Backend { message: String },

    /// Failed to encode or decode a cached value.
    #[error("Cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stored value has the wrong shape for the requested operation.
    #[error("Invalid cached value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },

    /// Invalid backend configuration.
    #[error("Cache configuration error: {0}")]
    Configuration(String),
}

impl CacheError {
    #[must_use]
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn invalid_value(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Returns `true` for the unexpected-error kind.
    pub fn is_unexpected(&self) -> bool {
        matches!(self, Self::Unexpected { .. })
    }

    /// Every cache fault is reported to end users as a server error.
    pub fn is_server_error(&self) -> bool {
        true
    }

    /// Get error category for logging/monitoring
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Unexpected { .. } => ErrorCategory::Unexpected,
            Self::Backend { .. } => ErrorCategory::Backend,
            Self::Serialization(_) | Self::InvalidValue { .. } => ErrorCategory::Serialization,
            Self::Configuration(_) => ErrorCategory::Configuration,
        }
    }
}

impl From<::redis::RedisError> for CacheError {
    fn from(e: ::redis::RedisError) -> Self {
        Self::backend(format!("Redis command failed: {e}"))
    }
}

impl From<deadpool_redis::PoolError> for CacheError {
    fn from(e: deadpool_redis::PoolError) -> Self {
        Self::backend(format!("Failed to get Redis connection: {e}"))
    }
}

impl From<CacheError> for CoreError {
    fn from(e: CacheError) -> Self {
        match e {
            CacheError::Serialization(inner) => CoreError::JsonError(inner),
            CacheError::Configuration(message) => CoreError::Configuration(message),
            other => CoreError::unexpected(other.to_string()),
        }
    }
}

/// Result type for cache operations
pub type CacheResult<T> = Result<T, CacheError>;
