//! Timestamp formatting shared by the report and the extraction folder name.

use chrono::{DateTime, Local, TimeZone, Utc};

use crate::config::ReportTimezone;
use crate::types::{CaptureEvent, EXTRACTION_FOLDER_SUFFIX};

/// Layout of capture timestamps in the report.
pub const CAPTURE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Convert a `TimeStamp` column value to a UTC instant, truncated to the second.
///
/// Floors toward negative infinity rather than truncating toward zero, so
/// pre-1970 values land one second earlier: `-1500` ms renders as
/// `1969-12-31 23:59:58`, not `23:59:59`.
///
/// Returns `None` when the value is outside chrono's representable range.
pub fn capture_time_from_millis(timestamp_ms: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(timestamp_ms.div_euclid(1000), 0)
}

/// Format a capture instant (e.g. "2023-11-14 22:13:20").
pub fn format_capture_timestamp(ts: DateTime<Utc>, timezone: ReportTimezone) -> String {
    match timezone {
        ReportTimezone::Utc => ts.format(CAPTURE_TIMESTAMP_FORMAT).to_string(),
        ReportTimezone::Local => ts
            .with_timezone(&Local)
            .format(CAPTURE_TIMESTAMP_FORMAT)
            .to_string(),
    }
}

/// Render one report line: `[timestamp] payload`.
pub fn format_capture_entry(event: &CaptureEvent, timezone: ReportTimezone) -> String {
    format!(
        "[{}] {}",
        format_capture_timestamp(event.captured_at, timezone),
        event.payload
    )
}

/// Name of the extraction folder for a run started at `now`
/// (e.g. "2024-06-05-14-30_Recall_Extraction").
pub fn extraction_folder_name<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("{}{}", now.format("%Y-%m-%d-%H-%M"), EXTRACTION_FOLDER_SUFFIX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CaptureKind;
    use chrono::NaiveDateTime;

    #[test]
    fn test_known_timestamp_formats_in_utc() {
        let ts = capture_time_from_millis(1_700_000_000_000).unwrap();
        assert_eq!(
            format_capture_timestamp(ts, ReportTimezone::Utc),
            "2023-11-14 22:13:20"
        );
    }

    #[test]
    fn test_format_then_parse_truncates_to_second() {
        for ms in [
            0_i64,
            999,
            1_000,
            1_700_000_000_123,
            1_717_171_717_999,
            -1,
            -1_500,
            253_402_300_799_000,
        ] {
            let formatted =
                format_capture_timestamp(capture_time_from_millis(ms).unwrap(), ReportTimezone::Utc);
            let parsed = NaiveDateTime::parse_from_str(&formatted, CAPTURE_TIMESTAMP_FORMAT)
                .unwrap()
                .and_utc();
            assert_eq!(parsed.timestamp(), ms.div_euclid(1000), "round trip for {ms}");
        }
    }

    #[test]
    fn test_pre_epoch_timestamp_floors() {
        let ts = capture_time_from_millis(-1_500).unwrap();
        assert_eq!(
            format_capture_timestamp(ts, ReportTimezone::Utc),
            "1969-12-31 23:59:58"
        );
    }

    #[test]
    fn test_out_of_range_timestamp_is_none() {
        assert!(capture_time_from_millis(i64::MAX).is_none());
    }

    #[test]
    fn test_capture_entry() {
        let event = CaptureEvent {
            timestamp_ms: 1_700_000_000_000,
            captured_at: capture_time_from_millis(1_700_000_000_000).unwrap(),
            kind: CaptureKind::WindowTitle,
            payload: "Notepad".to_string(),
        };
        assert_eq!(
            format_capture_entry(&event, ReportTimezone::Utc),
            "[2023-11-14 22:13:20] Notepad"
        );
    }

    #[test]
    fn test_extraction_folder_name() {
        let now = Utc.with_ymd_and_hms(2024, 6, 5, 14, 30, 59).unwrap();
        assert_eq!(extraction_folder_name(&now), "2024-06-05-14-30_Recall_Extraction");
    }
}
