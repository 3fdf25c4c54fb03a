//! Timestamp utilities

use chrono::{DateTime, FixedOffset, Offset, Utc};

/// Field reports are read in Western Indonesia Time (UTC+7)
const WIB_OFFSET_SECS: i32 = 7 * 3600;

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Convert milliseconds to duration
pub fn millis_to_duration(millis: u64) -> std::time::Duration {
    std::time::Duration::from_millis(millis)
}

/// Format an observation time as `DD/MM/YYYY HH:MM:SS` in UTC+7
pub fn format_wib(timestamp: &DateTime<Utc>) -> String {
    let offset = FixedOffset::east_opt(WIB_OFFSET_SECS).unwrap_or_else(|| Utc.fix());
    timestamp
        .with_timezone(&offset)
        .format("%d/%m/%Y %H:%M:%S")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::time::Duration;

    #[test]
    fn test_now_returns_recent_timestamp() {
        let timestamp = now();
        assert!(timestamp.timestamp() > 946_684_800); // 2000-01-01 00:00:00 UTC
        assert!(timestamp.timestamp() < 4_102_444_800); // 2100-01-01 00:00:00 UTC
    }

    #[test]
    fn test_millis_to_duration() {
        assert_eq!(millis_to_duration(0), Duration::from_millis(0));
        assert_eq!(millis_to_duration(1000), Duration::from_secs(1));
        assert_eq!(millis_to_duration(3_600_000), Duration::from_secs(3600));
    }

    #[test]
    fn test_format_wib_crosses_midnight() {
        let ts = Utc.with_ymd_and_hms(2025, 3, 1, 20, 5, 9).unwrap();
        assert_eq!(format_wib(&ts), "02/03/2025 03:05:09");
    }
}
