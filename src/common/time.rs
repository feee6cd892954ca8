//! Timestamp helpers for outbound protocol events.

use chrono::{SecondsFormat, Utc};

/// Current UTC time as an RFC 3339 string with millisecond precision,
/// e.g. `2026-08-28T12:00:00.123Z`.
pub fn utc_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    #[test]
    fn test_utc_timestamp_is_rfc3339() {
        // given (precondition): the system clock

        // when (operation):
        let ts = utc_timestamp();

        // then (expected result): parseable, UTC-suffixed, millisecond precision
        let parsed = DateTime::parse_from_rfc3339(&ts);
        assert!(parsed.is_ok(), "timestamp should be RFC 3339: {ts}");
        assert!(ts.ends_with('Z'), "timestamp should be UTC: {ts}");
    }
}
