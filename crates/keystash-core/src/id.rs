use thiserror::Error;

/// Identifiers are stored in 64-character columns upstream.
pub const MAX_ID_LEN: usize = 64;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdError {
    #[error("ID must not be empty")]
    Empty,

    #[error("ID exceeds {MAX_ID_LEN} characters: {0}")]
    TooLong(usize),

    #[error("ID contains a reserved character: {0:?}")]
    ReservedCharacter(char),
}

/// Generate a new opaque identifier (32 lowercase hex characters).
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Validate an externally supplied identifier.
///
/// Commas are rejected because identifiers end up in comma-joined
/// revocation lists.
pub fn validate_id(id: &str) -> Result<(), IdError> {
    if id.is_empty() {
        return Err(IdError::Empty);
    }
    let len = id.chars().count();
    if len > MAX_ID_LEN {
        return Err(IdError::TooLong(len));
    }
    if let Some(c) = id.chars().find(|c| *c == ',' || c.is_control()) {
        return Err(IdError::ReservedCharacter(c));
    }
    Ok(())
}
