//! Property-based tests for schedule arithmetic.

use chrono::{Datelike, NaiveDate};
use proptest::prelude::*;

use crate::recurring::schedule::{Frequency, next_date_after};

fn arb_date() -> impl Strategy<Value = NaiveDate> {
    (2000i32..=2099, 1u32..=12, 1u32..=31).prop_filter_map("valid date", |(y, m, d)| {
        NaiveDate::from_ymd_opt(y, m, d)
    })
}

fn arb_frequency() -> impl Strategy<Value = Frequency> {
    prop_oneof![
        Just(Frequency::Weekly),
        Just(Frequency::Monthly),
        Just(Frequency::Quarterly),
        Just(Frequency::Yearly),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Advancing always moves strictly forward in time.
    #[test]
    fn prop_strictly_increasing(date in arb_date(), freq in arb_frequency()) {
        prop_assert!(next_date_after(date, freq) > date);
    }

    /// Weekly advancement is exactly 7 days.
    #[test]
    fn prop_weekly_exact(date in arb_date()) {
        let next = next_date_after(date, Frequency::Weekly);
        prop_assert_eq!((next - date).num_days(), 7);
    }

    /// Month arithmetic never overshoots the day of month: the result's
    /// day is at most the source day (clamping only shrinks it).
    #[test]
    fn prop_day_never_grows(date in arb_date(), freq in arb_frequency()) {
        prop_assume!(freq != Frequency::Weekly);
        let next = next_date_after(date, freq);
        prop_assert!(next.day() <= date.day());
    }

    /// Monthly advancement lands in the immediately following calendar
    /// month.
    #[test]
    fn prop_monthly_lands_next_month(date in arb_date()) {
        let next = next_date_after(date, Frequency::Monthly);
        let expected = (date.month0() + 1) % 12 + 1;
        prop_assert_eq!(next.month(), expected);
    }
}
