//! Due-date advancement for recurring expense templates.

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How often a recurring expense falls due.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    /// Every 7 days.
    Weekly,
    /// Every calendar month.
    Monthly,
    /// Every 3 calendar months.
    Quarterly,
    /// Every calendar year.
    Yearly,
}

impl Frequency {
    /// Returns the string representation of the frequency.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::Yearly => "yearly",
        }
    }

    /// Parses a frequency from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "weekly" => Some(Self::Weekly),
            "monthly" => Some(Self::Monthly),
            "quarterly" => Some(Self::Quarterly),
            "yearly" => Some(Self::Yearly),
            _ => None,
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Returns the next due date after `current` for a frequency.
///
/// Month and year arithmetic clamps the day to the end of the shorter
/// month: Jan 31 + 1 month = Feb 28 (or 29 in leap years).
#[must_use]
pub fn next_date_after(current: NaiveDate, frequency: Frequency) -> NaiveDate {
    match frequency {
        Frequency::Weekly => current + Days::new(7),
        Frequency::Monthly => add_months(current, 1),
        Frequency::Quarterly => add_months(current, 3),
        Frequency::Yearly => add_months(current, 12),
    }
}

/// Adds calendar months, clamping the day to the target month's length.
fn add_months(date: NaiveDate, months: u32) -> NaiveDate {
    let zero_based = date.month0() + months;
    let year = date.year() + i32::try_from(zero_based / 12).unwrap_or(0);
    let month = zero_based % 12 + 1;

    let day = date.day().min(days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day)
        .unwrap_or(date)
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .map_or(28, |last| last.day())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_frequency_roundtrip() {
        for freq in [
            Frequency::Weekly,
            Frequency::Monthly,
            Frequency::Quarterly,
            Frequency::Yearly,
        ] {
            assert_eq!(Frequency::parse(freq.as_str()), Some(freq));
        }
        assert_eq!(Frequency::parse("daily"), None);
    }

    #[test]
    fn test_weekly_adds_seven_days() {
        assert_eq!(
            next_date_after(date(2026, 1, 28), Frequency::Weekly),
            date(2026, 2, 4)
        );
    }

    #[rstest]
    #[case(date(2026, 1, 15), date(2026, 2, 15))]
    #[case(date(2026, 1, 31), date(2026, 2, 28))] // clamp, 2026 not a leap year
    #[case(date(2024, 1, 31), date(2024, 2, 29))] // leap year clamp
    #[case(date(2026, 12, 10), date(2027, 1, 10))] // year rollover
    fn test_monthly(#[case] from: NaiveDate, #[case] expected: NaiveDate) {
        assert_eq!(next_date_after(from, Frequency::Monthly), expected);
    }

    #[rstest]
    #[case(date(2026, 1, 31), date(2026, 4, 30))] // clamp to April's 30 days
    #[case(date(2026, 11, 5), date(2027, 2, 5))] // year rollover
    fn test_quarterly(#[case] from: NaiveDate, #[case] expected: NaiveDate) {
        assert_eq!(next_date_after(from, Frequency::Quarterly), expected);
    }

    #[rstest]
    #[case(date(2026, 3, 1), date(2027, 3, 1))]
    #[case(date(2024, 2, 29), date(2025, 2, 28))] // leap day clamps forward
    fn test_yearly(#[case] from: NaiveDate, #[case] expected: NaiveDate) {
        assert_eq!(next_date_after(from, Frequency::Yearly), expected);
    }
}
