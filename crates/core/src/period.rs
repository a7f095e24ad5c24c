//! Payout period arithmetic.
//!
//! A payout period is one calendar month, written `YYYY-MM`. Eligibility
//! looks at conversions inside the period window; the cutoff is the last
//! calendar day of the period and processing happens on the 5th of the
//! following month.

use chrono::{Datelike, NaiveDate, TimeZone, Utc};

use crate::error::CoreError;
use crate::types::Timestamp;

/// Day of the following month on which payouts are processed.
const PROCESSING_DAY: u32 = 5;

/// One calendar-month payout period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayoutPeriod {
    year: i32,
    month: u32,
}

impl PayoutPeriod {
    /// Parse a `YYYY-MM` label.
    pub fn parse(label: &str) -> Result<Self, CoreError> {
        let invalid = || {
            CoreError::Validation(format!(
                "Invalid payout period '{label}', expected YYYY-MM"
            ))
        };

        let (year, month) = label.split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        if !(1..=12).contains(&month) {
            return Err(invalid());
        }
        Ok(Self { year, month })
    }

    /// The period containing `now`.
    pub fn containing(now: Timestamp) -> Self {
        Self {
            year: now.year(),
            month: now.month(),
        }
    }

    /// `YYYY-MM` label.
    pub fn label(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }

    /// First calendar day of the period.
    pub fn start_date(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .expect("validated year/month is a valid date")
    }

    fn next_month_start(&self) -> NaiveDate {
        let (y, m) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        NaiveDate::from_ymd_opt(y, m, 1).expect("validated year/month is a valid date")
    }

    /// Last calendar day of the period (the payout cutoff date).
    pub fn cutoff_date(&self) -> NaiveDate {
        self.next_month_start().pred_opt().expect("month start has a predecessor")
    }

    /// The 5th of the following month, when the payout run executes.
    pub fn processing_date(&self) -> NaiveDate {
        self.next_month_start()
            .with_day(PROCESSING_DAY)
            .expect("day 5 exists in every month")
    }

    /// Half-open UTC window `[start, end)` covering the full month.
    pub fn window(&self) -> (Timestamp, Timestamp) {
        let start = Utc
            .from_utc_datetime(&self.start_date().and_hms_opt(0, 0, 0).unwrap());
        let end = Utc
            .from_utc_datetime(&self.next_month_start().and_hms_opt(0, 0, 0).unwrap());
        (start, end)
    }
}

/// Approximate months spanned between the oldest and newest conversion of a
/// rollover balance, rounded up with a floor of 1.
pub fn months_accumulated(oldest: Timestamp, newest: Timestamp) -> i64 {
    let days = (newest - oldest).num_days();
    ((days + 29) / 30).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_valid_label() {
        let p = PayoutPeriod::parse("2024-01").unwrap();
        assert_eq!(p.label(), "2024-01");
    }

    #[test]
    fn rejects_malformed_labels() {
        for label in ["2024", "2024-13", "2024-00", "24-01", "2024-1", "abcd-ef"] {
            assert!(PayoutPeriod::parse(label).is_err(), "accepted '{label}'");
        }
    }

    #[test]
    fn cutoff_is_last_day_of_month() {
        assert_eq!(
            PayoutPeriod::parse("2024-01").unwrap().cutoff_date(),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()
        );
        // Leap February.
        assert_eq!(
            PayoutPeriod::parse("2024-02").unwrap().cutoff_date(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        assert_eq!(
            PayoutPeriod::parse("2023-02").unwrap().cutoff_date(),
            NaiveDate::from_ymd_opt(2023, 2, 28).unwrap()
        );
    }

    #[test]
    fn processing_is_fifth_of_next_month() {
        assert_eq!(
            PayoutPeriod::parse("2024-01").unwrap().processing_date(),
            NaiveDate::from_ymd_opt(2024, 2, 5).unwrap()
        );
    }

    #[test]
    fn december_rolls_into_next_year() {
        let p = PayoutPeriod::parse("2024-12").unwrap();
        assert_eq!(p.cutoff_date(), NaiveDate::from_ymd_opt(2024, 12, 31).unwrap());
        assert_eq!(p.processing_date(), NaiveDate::from_ymd_opt(2025, 1, 5).unwrap());
    }

    #[test]
    fn window_covers_the_full_month() {
        let (start, end) = PayoutPeriod::parse("2024-02").unwrap().window();
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn containing_uses_now() {
        let now = Utc.with_ymd_and_hms(2024, 7, 15, 9, 30, 0).unwrap();
        assert_eq!(PayoutPeriod::containing(now).label(), "2024-07");
    }

    #[test]
    fn months_accumulated_has_floor_of_one() {
        let t = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        assert_eq!(months_accumulated(t, t), 1);
    }

    #[test]
    fn months_accumulated_rounds_up() {
        let oldest = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let newest = Utc.with_ymd_and_hms(2024, 2, 15, 0, 0, 0).unwrap();
        // 45 days -> 2 months.
        assert_eq!(months_accumulated(oldest, newest), 2);
    }
}
