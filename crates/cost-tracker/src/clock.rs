//! Time source for record timestamps and the cost window.

use chrono::{NaiveDateTime, Timelike, Utc};

/// Supplies the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Wall-clock time in UTC.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Utc::now().naive_utc()
    }
}

/// A clock pinned to one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// Format a naive datetime as ISO-8601 at microsecond precision.
///
/// The fractional part is omitted when it is zero:
/// `2024-01-01T00:00:00` vs `2024-01-01T00:00:00.000250`.
#[must_use]
pub fn iso_timestamp(datetime: NaiveDateTime) -> String {
    if datetime.nanosecond() / 1_000 == 0 {
        datetime.format("%Y-%m-%dT%H:%M:%S").to_string()
    } else {
        datetime.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_iso_timestamp_whole_second() {
        let dt = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(iso_timestamp(dt), "2024-01-01T00:00:00");
    }

    #[test]
    fn test_iso_timestamp_microseconds() {
        let dt = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_micro_opt(13, 4, 5, 250)
            .unwrap();
        assert_eq!(iso_timestamp(dt), "2024-01-01T13:04:05.000250");
    }

    #[test]
    fn test_iso_timestamp_drops_sub_microsecond() {
        let dt = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_nano_opt(13, 4, 5, 999)
            .unwrap();
        assert_eq!(iso_timestamp(dt), "2024-01-01T13:04:05");
    }

    #[test]
    fn test_fixed_clock() {
        let dt = NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(1, 2, 3)
            .unwrap();
        assert_eq!(FixedClock(dt).now(), dt);
    }
}
