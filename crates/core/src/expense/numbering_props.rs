//! Property-based tests for expense numbering.

use chrono::NaiveDate;
use proptest::prelude::*;

use crate::expense::numbering::{
    format_number, parse_trailing_sequence, period_key, seed_from_scan,
};

/// Strategy for alphanumeric prefixes (no dashes, like real settings).
fn arb_prefix() -> impl Strategy<Value = String> {
    "[A-Z]{1,10}"
}

/// Strategy for valid dates within the application's working range.
fn arb_date() -> impl Strategy<Value = NaiveDate> {
    (2000i32..=2099, 1u32..=12, 1u32..=28)
        .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// format → parse round-trips the sequence for any period key.
    #[test]
    fn prop_format_parse_roundtrip(
        prefix in arb_prefix(),
        date in arb_date(),
        seq in 1i64..=1_000_000
    ) {
        let key = period_key(&prefix, date);
        let number = format_number(&key, seq);
        prop_assert_eq!(parse_trailing_sequence(&number), Some(seq));
    }

    /// Numbers within one period sort in sequence order up to 9999, the
    /// zero-padding width (the numbering lookup orders by the string).
    #[test]
    fn prop_lexicographic_order_matches_sequence(
        prefix in arb_prefix(),
        date in arb_date(),
        a in 1i64..=9999,
        b in 1i64..=9999
    ) {
        prop_assume!(a < b);
        let key = period_key(&prefix, date);
        prop_assert!(format_number(&key, a) < format_number(&key, b));
    }

    /// The scan seed plus one is always strictly greater than the
    /// highest existing sequence, so continued sequences never collide.
    #[test]
    fn prop_seed_continues_sequence(
        prefix in arb_prefix(),
        date in arb_date(),
        seq in 1i64..=1_000_000
    ) {
        let key = period_key(&prefix, date);
        let highest = format_number(&key, seq);
        prop_assert_eq!(seed_from_scan(Some(&highest)) + 1, seq + 1);
    }

    /// Unparsable tails fall back to a fresh sequence starting at 1.
    #[test]
    fn prop_garbage_tail_restarts(tail in "[a-zA-Z]{1,8}") {
        let number = format!("EXP-20260115-{tail}");
        prop_assert_eq!(seed_from_scan(Some(&number)), 0);
    }

    /// The period key embeds the date as YYYYMMDD after the prefix.
    #[test]
    fn prop_period_key_shape(prefix in arb_prefix(), date in arb_date()) {
        let key = period_key(&prefix, date);
        let has_prefix = key.starts_with(&format!("{prefix}-"));
        prop_assert!(has_prefix);
        let date_part = &key[prefix.len() + 1..];
        prop_assert_eq!(date_part.len(), 8);
        prop_assert!(date_part.chars().all(|c| c.is_ascii_digit()));
    }
}
