use thiserror::Error;

/// Core error types for keystash operations
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid ID: {0}")]
    InvalidId(#[from] crate::id::IdError),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("{kind} not found: {id}")]
    NotFound { kind: String, id: String },

    #[error("Conflict occurred attempting to store {kind}: {details}")]
    Conflict { kind: String, details: String },

    #[error("Expecting to find {attribute} in {target}")]
    Validation { attribute: String, target: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("An unexpected error prevented the server from fulfilling your request: {0}")]
    Unexpected(String),
}

impl CoreError {
    /// Create a new NotFound error
    pub fn not_found(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: kind.into(),
            id: id.into(),
        }
    }

    /// Create a new Conflict error
    pub fn conflict(kind: impl Into<String>, details: impl Into<String>) -> Self {
        Self::Conflict {
            kind: kind.into(),
            details: details.into(),
        }
    }

    /// Create a new Validation error
    pub fn validation(attribute: impl Into<String>, target: impl Into<String>) -> Self {
        Self::Validation {
            attribute: attribute.into(),
            target: target.into(),
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Create a new Configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create a new Unexpected error
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }

    /// Check if this error is a client error (4xx category)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidId(_)
                | Self::JsonError(_)
                | Self::NotFound { .. }
                | Self::Conflict { .. }
                | Self::Validation { .. }
                | Self::InvalidRequest(_)
        )
    }

    /// Check if this error is a server error (5xx category)
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::Unexpected(_))
    }

    /// Get error category for logging/monitoring
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidId(_)
            | Self::Validation { .. }
            | Self::InvalidRequest(_) => ErrorCategory::Validation,
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::Conflict { .. } => ErrorCategory::Conflict,
            Self::JsonError(_) => ErrorCategory::Serialization,
            Self::Configuration(_) => ErrorCategory::Configuration,
            Self::Unexpected(_) => ErrorCategory::Unexpected,
        }
    }
}

/// Error categories for monitoring and classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    NotFound,
    Conflict,
    Serialization,
    Backend,
    Configuration,
    Unexpected,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation => write!(f, "validation"),
            Self::NotFound => write!(f, "not_found"),
            Self::Conflict => write!(f, "conflict"),
            Self::Serialization => write!(f, "serialization"),
            Self::Backend => write!(f, "backend"),
            Self::Configuration => write!(f, "configuration"),
            Self::Unexpected => write!(f, "unexpected"),
        }
    }
}

/// Convenience result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
