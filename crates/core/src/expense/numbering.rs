//! Expense number period keys and sequences.
//!
//! Expense numbers have the shape `{prefix}-{YYYYMMDD}-{seq:04}`, where
//! the sequence restarts per hub, day, and prefix. The functions here
//! are pure: the atomic counter increment that serializes concurrent
//! assignments lives in the persistence layer, seeded from
//! [`seed_from_scan`] so sequences continue across numbers that predate
//! the counter.

use chrono::NaiveDate;

/// Fallback prefix used when the settings lookup fails or auto
/// numbering is disabled.
pub const DEFAULT_PREFIX: &str = "EXP";

/// Builds the period key for a prefix and reference date, e.g.
/// `EXP-20260115`.
#[must_use]
pub fn period_key(prefix: &str, reference_date: NaiveDate) -> String {
    format!("{}-{}", prefix, reference_date.format("%Y%m%d"))
}

/// Formats a full expense number from a period key and sequence.
///
/// Sequences are zero-padded to 4 digits and grow beyond that rather
/// than wrapping (`...-9999` is followed by `...-10000`).
#[must_use]
pub fn format_number(period_key: &str, sequence: i64) -> String {
    format!("{period_key}-{sequence:04}")
}

/// Parses the trailing sequence of an expense number (the integer after
/// the final `-`). Returns `None` when the tail is not an integer.
#[must_use]
pub fn parse_trailing_sequence(number: &str) -> Option<i64> {
    number.rsplit('-').next()?.parse().ok()
}

/// Derives the counter seed from the highest pre-counter number in a
/// period: its trailing sequence, or 0 when no such number exists or
/// its tail does not parse.
#[must_use]
pub fn seed_from_scan(highest_number: Option<&str>) -> i64 {
    highest_number
        .and_then(parse_trailing_sequence)
        .unwrap_or(0)
}

/// Resolves the prefix to use for number generation.
///
/// The configured prefix is only consulted when auto numbering is
/// enabled and the prefix is non-empty; otherwise the default applies.
/// A numberless expense is never persisted, so even with auto numbering
/// disabled a number is still generated under the default prefix.
#[must_use]
pub fn effective_prefix(auto_numbering: bool, configured: &str) -> &str {
    if auto_numbering && !configured.trim().is_empty() {
        configured
    } else {
        DEFAULT_PREFIX
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_period_key() {
        assert_eq!(period_key("EXP", date(2026, 1, 15)), "EXP-20260115");
        assert_eq!(period_key("GASTO", date(2026, 12, 1)), "GASTO-20261201");
    }

    #[test]
    fn test_format_number_zero_padded() {
        assert_eq!(format_number("EXP-20260115", 1), "EXP-20260115-0001");
        assert_eq!(format_number("EXP-20260115", 42), "EXP-20260115-0042");
        assert_eq!(format_number("EXP-20260115", 9999), "EXP-20260115-9999");
    }

    #[test]
    fn test_format_number_grows_beyond_9999() {
        assert_eq!(format_number("EXP-20260115", 10000), "EXP-20260115-10000");
    }

    #[test]
    fn test_parse_trailing_sequence() {
        assert_eq!(parse_trailing_sequence("EXP-20260115-0001"), Some(1));
        assert_eq!(parse_trailing_sequence("EXP-20260115-0420"), Some(420));
        assert_eq!(parse_trailing_sequence("EXP-20260115-10000"), Some(10000));
        assert_eq!(parse_trailing_sequence("EXP-20260115-abc"), None);
        assert_eq!(parse_trailing_sequence("no-dashes-here"), None);
    }

    #[test]
    fn test_seed_from_scan() {
        assert_eq!(seed_from_scan(Some("EXP-20260115-0007")), 7);
        assert_eq!(seed_from_scan(Some("EXP-20260115-xyz")), 0);
        assert_eq!(seed_from_scan(None), 0);
    }

    #[test]
    fn test_effective_prefix() {
        assert_eq!(effective_prefix(true, "GASTO"), "GASTO");
        assert_eq!(effective_prefix(true, ""), "EXP");
        assert_eq!(effective_prefix(true, "   "), "EXP");
        assert_eq!(effective_prefix(false, "GASTO"), "EXP");
    }
}
