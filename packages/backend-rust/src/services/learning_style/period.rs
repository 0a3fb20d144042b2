use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PeriodError {
    #[error("Invalid period format. Use YYYY-MM")]
    Format,
    #[error("period {0} is outside the supported calendar range")]
    OutOfRange(String),
}

/// A calendar month, written `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period {
    year: i32,
    month: u32,
}

/// Inclusive bounds of a period, from 00:00:00 on day 1 to 23:59:59 on the
/// last day, in the reference timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

impl DateRange {
    pub fn start_utc(&self) -> DateTime<Utc> {
        self.start.with_timezone(&Utc)
    }

    pub fn end_utc(&self) -> DateTime<Utc> {
        self.end.with_timezone(&Utc)
    }
}

impl Period {
    pub fn new(year: i32, month: u32) -> Result<Self, PeriodError> {
        if !(0..=9999).contains(&year) || !(1..=12).contains(&month) {
            return Err(PeriodError::Format);
        }
        Ok(Self { year, month })
    }

    /// The key learning-style records are stored under.
    pub fn first_day(&self) -> Result<NaiveDate, PeriodError> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .ok_or_else(|| PeriodError::OutOfRange(self.to_string()))
    }

    pub fn last_day(&self) -> Result<NaiveDate, PeriodError> {
        let (year, month) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        NaiveDate::from_ymd_opt(year, month, 1)
            .and_then(|next| next.pred_opt())
            .ok_or_else(|| PeriodError::OutOfRange(self.to_string()))
    }

    pub fn date_range(&self, tz: FixedOffset) -> Result<DateRange, PeriodError> {
        let out_of_range = || PeriodError::OutOfRange(self.to_string());

        let start = tz
            .from_local_datetime(&self.first_day()?.and_time(NaiveTime::MIN))
            .single()
            .ok_or_else(out_of_range)?;
        let end_time = NaiveTime::from_hms_opt(23, 59, 59).ok_or_else(out_of_range)?;
        let end = tz
            .from_local_datetime(&self.last_day()?.and_time(end_time))
            .single()
            .ok_or_else(out_of_range)?;

        Ok(DateRange { start, end })
    }

    /// The calendar month before the one `now` falls in, seen from `tz`.
    pub fn previous(now: DateTime<Utc>, tz: FixedOffset) -> Self {
        let local = now.with_timezone(&tz);
        if local.month() == 1 {
            Self {
                year: local.year() - 1,
                month: 12,
            }
        } else {
            Self {
                year: local.year(),
                month: local.month() - 1,
            }
        }
    }
}

impl FromStr for Period {
    type Err = PeriodError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let bytes = raw.as_bytes();
        let shaped = bytes.len() == 7
            && bytes[4] == b'-'
            && bytes[..4].iter().all(u8::is_ascii_digit)
            && bytes[5..].iter().all(u8::is_ascii_digit);
        if !shaped {
            return Err(PeriodError::Format);
        }

        let year = raw[..4].parse::<i32>().map_err(|_| PeriodError::Format)?;
        let month = raw[5..].parse::<u32>().map_err(|_| PeriodError::Format)?;
        Self::new(year, month)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use proptest::prelude::*;

    use super::*;

    fn jakarta() -> FixedOffset {
        FixedOffset::east_opt(7 * 3600).unwrap()
    }

    #[test]
    fn leap_february_spans_29_days() {
        let period: Period = "2024-02".parse().unwrap();
        let range = period.date_range(jakarta()).unwrap();

        assert_eq!(range.start.naive_local().to_string(), "2024-02-01 00:00:00");
        assert_eq!(range.end.naive_local().to_string(), "2024-02-29 23:59:59");
        assert_eq!(range.start_utc().to_rfc3339(), "2024-01-31T17:00:00+00:00");
    }

    #[test]
    fn december_ends_on_the_31st() {
        let period: Period = "2023-12".parse().unwrap();
        assert_eq!(period.last_day().unwrap(), NaiveDate::from_ymd_opt(2023, 12, 31).unwrap());
    }

    #[test]
    fn rejects_malformed_periods() {
        for raw in ["2024-13", "24-02", "2024-00", "2024-2", "2024/02", "", "2024-02-01", "abcd-ef", "+024-02"] {
            assert_eq!(raw.parse::<Period>(), Err(PeriodError::Format), "{raw}");
        }
    }

    #[test]
    fn previous_month_wraps_the_year() {
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 3, 0, 0).unwrap();
        assert_eq!(Period::previous(now, jakarta()).to_string(), "2023-12");
    }

    #[test]
    fn previous_month_uses_the_reference_timezone() {
        // 19:00 UTC on Jan 31 is already Feb 1 in UTC+7
        let now = Utc.with_ymd_and_hms(2024, 1, 31, 19, 0, 0).unwrap();
        assert_eq!(Period::previous(now, jakarta()).to_string(), "2024-01");
    }

    proptest! {
        #[test]
        fn valid_periods_cover_the_whole_month(year in 1900i32..2200, month in 1u32..=12) {
            let raw = format!("{year:04}-{month:02}");
            let period: Period = raw.parse().unwrap();
            prop_assert_eq!(period.to_string(), raw);

            let range = period.date_range(jakarta()).unwrap();
            prop_assert_eq!(range.start.day(), 1);
            prop_assert_eq!(range.start.month(), month);
            prop_assert_eq!(range.end.month(), month);

            let after = range.end + Duration::seconds(1);
            prop_assert_eq!(after.day(), 1);
            prop_assert_ne!(after.month(), month);
        }

        #[test]
        fn accepted_strings_round_trip(raw in "\\PC{0,9}") {
            if let Ok(period) = raw.parse::<Period>() {
                prop_assert_eq!(period.to_string(), raw);
            }
        }

        #[test]
        fn months_past_twelve_are_rejected(year in 0i32..=9999, month in 13u32..=99) {
            let raw = format!("{year:04}-{month:02}");
            prop_assert_eq!(raw.parse::<Period>(), Err(PeriodError::Format));
        }
    }
}
