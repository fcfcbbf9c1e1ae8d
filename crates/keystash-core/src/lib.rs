pub mod error;
pub mod id;
pub mod time;

pub use error::{CoreError, ErrorCategory, Result};
pub use id::{IdError, MAX_ID_LEN, generate_id, validate_id};
pub use time::{normalize_utc, now_utc};
