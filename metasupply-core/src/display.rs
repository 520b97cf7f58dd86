//! Presentation helpers shared by the CLI and the wasm bindings.

use chrono::{TimeZone, Utc};

use crate::record::{Principal, RecordId, NANOS_PER_MILLI};

/// Characters of an id shown before the ellipsis.
pub const HASH_PREFIX_LEN: usize = 10;

/// Characters of a principal shown before the ellipsis.
pub const PRINCIPAL_PREFIX_LEN: usize = 8;

/// Format a registry timestamp (nanoseconds) as a UTC string with
/// millisecond precision.
pub fn format_timestamp(timestamp_ns: u64) -> String {
    let millis = timestamp_ns / NANOS_PER_MILLI;
    let secs = (millis / 1000) as i64;
    let nsecs = ((millis % 1000) * NANOS_PER_MILLI) as u32;
    match Utc.timestamp_opt(secs, nsecs) {
        chrono::LocalResult::Single(dt) => dt.format("%Y-%m-%d %H:%M:%S%.3f UTC").to_string(),
        _ => format!("{millis}ms"),
    }
}

/// `abcdef1234...`
pub fn short_hash(id: &RecordId) -> String {
    truncate(id.as_str(), HASH_PREFIX_LEN)
}

pub fn short_principal(principal: &Principal) -> String {
    truncate(principal.as_str(), PRINCIPAL_PREFIX_LEN)
}

/// Shortened predecessor id, or `N/A` for a chain root.
pub fn previous_or_na(previous: Option<&RecordId>) -> String {
    previous.map_or_else(|| "N/A".to_string(), short_hash)
}

fn truncate(text: &str, len: usize) -> String {
    let prefix: String = text.chars().take(len).collect();
    format!("{prefix}...")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_timestamp() {
        // 2024-01-15 12:30:45.123 UTC, plus sub-millisecond noise
        let ts = 1_705_321_845_123_456_789;
        assert_eq!(format_timestamp(ts), "2024-01-15 12:30:45.123 UTC");
        assert_eq!(format_timestamp(0), "1970-01-01 00:00:00.000 UTC");
    }

    #[test]
    fn test_short_forms() {
        let id = RecordId::new("0123456789abcdef");
        assert_eq!(short_hash(&id), "0123456789...");
        assert_eq!(
            short_principal(&Principal::new("2vxsx-fae-long")),
            "2vxsx-fa..."
        );
        assert_eq!(short_hash(&RecordId::new("abc")), "abc...");
    }

    #[test]
    fn test_previous_or_na() {
        assert_eq!(previous_or_na(None), "N/A");
        assert_eq!(
            previous_or_na(Some(&RecordId::new("0123456789abcdef"))),
            "0123456789..."
        );
    }
}
