//! UTC timestamp helpers.

use time::OffsetDateTime;

/// Current time in UTC.
pub fn now_utc() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}

/// Shift a timestamp with any offset to the same instant in UTC.
pub fn normalize_utc(datetime: OffsetDateTime) -> OffsetDateTime {
    datetime.to_offset(time::UtcOffset::UTC)
}
