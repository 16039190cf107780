//! Time utilities for freezeguard
//!
//! All evaluation happens against an injected [`TimeSource`] so that window
//! logic can be exercised at fixed instants. The binary uses [`SystemClock`]
//! unless a mock instant is supplied, in which case it uses [`FixedClock`].
//!
//! Naive local timestamps (no offset) are attached to a zone with
//! [`localize`], which resolves DST folds and gaps deterministically:
//! - an ambiguous local time (fall-back) maps to the later, standard-time instant
//! - a non-existent local time (spring-forward gap) is read with the offset
//!   in effect before the transition

use chrono::{
    DateTime, FixedOffset, LocalResult, NaiveDate, NaiveDateTime, Offset, SecondsFormat, TimeZone,
    Timelike, Utc,
};
use chrono_tz::Tz;
use std::fmt;

use crate::{FreezeError, Result};

/// Supplies the current instant.
pub trait TimeSource {
    fn now_utc(&self) -> DateTime<Utc>;
}

/// The operating system wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at a single instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(DateTime<Utc>);

impl FixedClock {
    pub fn new(instant: DateTime<Utc>) -> Self {
        Self(instant)
    }
}

impl TimeSource for FixedClock {
    fn now_utc(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Parse an IANA zone identifier such as `Europe/Berlin`
pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| FreezeError::UnknownTimezone(name.to_string()))
}

/// Attach a zone to a naive local time.
pub fn localize(tz: &Tz, naive: &NaiveDateTime) -> DateTime<Tz> {
    match tz.from_local_datetime(naive) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(earlier, later) => {
            tracing::debug!(
                local = %naive,
                earlier = %earlier,
                later = %later,
                "Ambiguous local time, using the later instant"
            );
            later
        }
        LocalResult::None => {
            // Offset a day earlier is the one in effect before the gap
            let day_before = naive
                .checked_sub_signed(chrono::Duration::days(1))
                .unwrap_or(*naive);
            let before = tz.offset_from_utc_datetime(&day_before).fix();
            let utc = *naive - chrono::Duration::seconds(i64::from(before.local_minus_utc()));
            let resolved = tz.from_utc_datetime(&utc);
            tracing::debug!(
                local = %naive,
                resolved = %resolved,
                "Non-existent local time, using the pre-transition offset"
            );
            resolved
        }
    }
}

/// A window bound as written in configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timestamp {
    /// Carries its own UTC offset
    Zoned(DateTime<FixedOffset>),
    /// Local wall-clock time in the configured zone
    Naive(NaiveDateTime),
}

impl Timestamp {
    /// Resolve to an absolute instant in the given zone
    pub fn in_zone(&self, tz: &Tz) -> DateTime<Tz> {
        match self {
            Timestamp::Zoned(dt) => dt.with_timezone(tz),
            Timestamp::Naive(naive) => localize(tz, naive),
        }
    }

    pub fn is_naive(&self) -> bool {
        matches!(self, Timestamp::Naive(_))
    }
}

const ZONED_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%:z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%:z",
    "%Y-%m-%d %H:%M%:z",
    "%Y-%m-%dT%H:%M:%S%z",
    "%Y-%m-%dT%H:%M%z",
    "%Y-%m-%d %H:%M:%S%z",
    "%Y-%m-%d %H:%M%z",
];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Parse a date-time string, keeping track of whether it carried an offset.
///
/// Accepts RFC 3339 (`2023-12-24T00:00:00Z`), ISO-8601 with or without
/// seconds and offset, a space instead of `T`, and a bare `YYYY-MM-DD`.
pub fn parse_timestamp(value: &str) -> Result<Timestamp> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(FreezeError::timestamp(value, "empty value"));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(Timestamp::Zoned(dt));
    }

    let normalized = match trimmed.strip_suffix(['Z', 'z']) {
        Some(rest) => format!("{rest}+00:00"),
        None => trimmed.to_string(),
    };
    for format in ZONED_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(&normalized, format) {
            return Ok(Timestamp::Zoned(dt));
        }
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(Timestamp::Naive(naive));
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        && let Some(midnight) = date.and_hms_opt(0, 0, 0)
    {
        return Ok(Timestamp::Naive(midnight));
    }

    Err(FreezeError::timestamp(
        value,
        "expected an ISO-8601 date-time such as 2023-12-24T00:00 or 2023-12-24T00:00:00+01:00",
    ))
}

/// Parse an absolute instant (RFC 3339, offset required)
pub fn parse_instant(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| FreezeError::timestamp(value, e.to_string()))
}

/// ISO-8601 with numeric offset, e.g. `2023-12-25T10:00:00+00:00`.
/// Sub-second digits appear only when present, at microsecond precision.
pub fn format_iso<Z: TimeZone>(dt: &DateTime<Z>) -> String
where
    Z::Offset: fmt::Display,
{
    let seconds = if dt.nanosecond() == 0 {
        SecondsFormat::Secs
    } else {
        SecondsFormat::Micros
    };
    dt.to_rfc3339_opts(seconds, false)
}

/// Format a zoned time for the run summary, e.g. `2023-12-25 11:00:00 CET`
pub fn format_summary_local(dt: &DateTime<Tz>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S %Z").to_string()
}

/// Format a UTC time for the run summary, e.g. `2023-12-25 10:00:00 UTC`
pub fn format_summary_utc(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Format a window bound for the run summary, e.g. `2023-12-24 00:00:00+00:00`
pub fn format_window_bound(dt: &DateTime<Tz>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S%:z").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn naive(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn test_fixed_clock() {
        let instant = Utc.with_ymd_and_hms(2023, 12, 25, 10, 0, 0).unwrap();
        let clock = FixedClock::new(instant);
        assert_eq!(clock.now_utc(), instant);

        let berlin = parse_timezone("Europe/Berlin").unwrap();
        let local = clock.now_utc().with_timezone(&berlin);
        assert_eq!(local.naive_local(), naive(2023, 12, 25, 11, 0));
    }

    #[test]
    fn test_parse_timezone() {
        assert_eq!(parse_timezone("UTC").unwrap(), Tz::UTC);
        assert_eq!(
            parse_timezone("America/New_York").unwrap(),
            Tz::America__New_York
        );
        assert!(matches!(
            parse_timezone("Mars/Olympus_Mons"),
            Err(FreezeError::UnknownTimezone(_))
        ));
    }

    #[test]
    fn test_localize_single() {
        let tz = Tz::Europe__Berlin;
        let dt = localize(&tz, &naive(2023, 7, 1, 12, 0));
        assert_eq!(dt.with_timezone(&Utc).naive_utc(), naive(2023, 7, 1, 10, 0));
    }

    #[test]
    fn test_localize_ambiguous_uses_later_instant() {
        // 01:30 happens twice in New York on 2023-11-05
        let tz = Tz::America__New_York;
        let dt = localize(&tz, &naive(2023, 11, 5, 1, 30));
        assert_eq!(dt.with_timezone(&Utc).naive_utc(), naive(2023, 11, 5, 6, 30));
    }

    #[test]
    fn test_localize_gap_uses_previous_offset() {
        // 02:30 does not exist in New York on 2023-03-12
        let tz = Tz::America__New_York;
        let dt = localize(&tz, &naive(2023, 3, 12, 2, 30));
        assert_eq!(dt.with_timezone(&Utc).naive_utc(), naive(2023, 3, 12, 7, 30));
        assert_eq!(dt.naive_local(), naive(2023, 3, 12, 3, 30));
    }

    #[test]
    fn test_parse_timestamp_naive_forms() {
        for value in [
            "2023-12-24T00:00",
            "2023-12-24T00:00:00",
            "2023-12-24 00:00",
            "2023-12-24 00:00:00",
            "2023-12-24",
        ] {
            assert_eq!(
                parse_timestamp(value).unwrap(),
                Timestamp::Naive(naive(2023, 12, 24, 0, 0)),
                "failed on {value}"
            );
        }
    }

    #[test]
    fn test_parse_timestamp_zoned_forms() {
        let expected = Utc.with_ymd_and_hms(2023, 12, 23, 23, 0, 0).unwrap();
        for value in [
            "2023-12-24T00:00:00+01:00",
            "2023-12-24T00:00+01:00",
            "2023-12-24 00:00:00+01:00",
            "2023-12-24T00:00:00+0100",
            "2023-12-23T23:00:00Z",
            "2023-12-23T23:00Z",
        ] {
            match parse_timestamp(value).unwrap() {
                Timestamp::Zoned(dt) => {
                    assert_eq!(dt.with_timezone(&Utc), expected, "failed on {value}")
                }
                other => panic!("expected zoned timestamp for {value}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        for value in ["", "tomorrow", "2023-13-01T00:00", "24/12/2023", "2023-12-24T25:00"] {
            assert!(
                parse_timestamp(value).is_err(),
                "expected '{value}' to be rejected"
            );
        }
    }

    #[test]
    fn test_timestamp_in_zone() {
        let tz = Tz::Europe__Berlin;
        let naive_bound = parse_timestamp("2023-12-24T00:00").unwrap();
        assert!(naive_bound.is_naive());
        assert_eq!(
            naive_bound.in_zone(&tz).with_timezone(&Utc),
            Utc.with_ymd_and_hms(2023, 12, 23, 23, 0, 0).unwrap()
        );

        let zoned_bound = parse_timestamp("2023-12-24T00:00:00Z").unwrap();
        assert!(!zoned_bound.is_naive());
        assert_eq!(
            zoned_bound.in_zone(&tz).with_timezone(&Utc),
            Utc.with_ymd_and_hms(2023, 12, 24, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_parse_instant() {
        let instant = parse_instant("2023-11-04T12:00:00Z").unwrap();
        assert_eq!(instant, Utc.with_ymd_and_hms(2023, 11, 4, 12, 0, 0).unwrap());
        assert!(parse_instant("2023-11-04T12:00:00").is_err());
    }

    #[test]
    fn test_format_iso() {
        let utc = Utc.with_ymd_and_hms(2023, 12, 25, 10, 0, 0).unwrap();
        assert_eq!(format_iso(&utc), "2023-12-25T10:00:00+00:00");

        let local = utc.with_timezone(&Tz::Asia__Kolkata);
        assert_eq!(format_iso(&local), "2023-12-25T15:30:00+05:30");

        let precise = utc + chrono::Duration::microseconds(1500);
        assert_eq!(format_iso(&precise), "2023-12-25T10:00:00.001500+00:00");
    }

    #[test]
    fn test_summary_formats() {
        let utc = Utc.with_ymd_and_hms(2023, 12, 25, 10, 0, 0).unwrap();
        let local = utc.with_timezone(&Tz::Europe__Berlin);
        assert_eq!(format_summary_utc(&utc), "2023-12-25 10:00:00 UTC");
        assert_eq!(format_summary_local(&local), "2023-12-25 11:00:00 CET");
        assert_eq!(format_window_bound(&local), "2023-12-25 11:00:00+01:00");
    }
}
