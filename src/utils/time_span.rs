//! Parsing of compact duration tokens such as `10s`, `5m`, `1h` or `2d`.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use thiserror::Error;

static TIME_SPAN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^([0-9]+)([smhd])$").unwrap());

/// Errors produced when a duration token cannot be read.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TimeSpanError {
    /// The token is not `<digits><unit>`.
    #[error("invalid time span `{0}`, use a number followed by s, m, h or d")]
    Malformed(String),

    /// The token is well formed but does not fit in a duration.
    #[error("time span `{0}` is too large")]
    Overflow(String),
}

/// Parses a single `<digits><unit>` token, where the unit is one of `s`, `m`, `h`, `d`.
///
/// Units are case-insensitive. Surrounding whitespace and compound tokens
/// like `1h30m` are rejected.
pub fn parse_time_span(token: &str) -> Result<Duration, TimeSpanError> {
    let lowered = token.to_ascii_lowercase();
    let caps = TIME_SPAN
        .captures(&lowered)
        .ok_or_else(|| TimeSpanError::Malformed(token.to_string()))?;

    let value: u64 = caps[1]
        .parse()
        .map_err(|_| TimeSpanError::Overflow(token.to_string()))?;

    let unit_secs = match &caps[2] {
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        "d" => 24 * 60 * 60,
        _ => unreachable!("unit is constrained by the pattern"),
    };

    value
        .checked_mul(unit_secs)
        .map(Duration::from_secs)
        .ok_or_else(|| TimeSpanError::Overflow(token.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("90s", 90 ; "seconds")]
    #[test_case("5m", 5 * 60 ; "minutes")]
    #[test_case("1h", 60 * 60 ; "hours")]
    #[test_case("2d", 2 * 24 * 60 * 60 ; "days")]
    #[test_case("10M", 10 * 60 ; "uppercase unit")]
    #[test_case("0s", 0 ; "zero")]
    #[test_case("007m", 7 * 60 ; "leading zeros")]
    fn test_valid_spans(token: &str, expected_secs: u64) {
        assert_eq!(
            parse_time_span(token),
            Ok(Duration::from_secs(expected_secs))
        );
    }

    #[test_case("3x" ; "unknown unit")]
    #[test_case("1h30m" ; "compound")]
    #[test_case("" ; "empty")]
    #[test_case("m" ; "missing number")]
    #[test_case("10" ; "missing unit")]
    #[test_case(" 10s" ; "leading space")]
    #[test_case("10s " ; "trailing space")]
    #[test_case("-5m" ; "negative")]
    #[test_case("1.5h" ; "fractional")]
    fn test_malformed_spans(token: &str) {
        assert_eq!(
            parse_time_span(token),
            Err(TimeSpanError::Malformed(token.to_string()))
        );
    }

    #[test]
    fn test_overflowing_span() {
        assert_eq!(
            parse_time_span("99999999999999999999d"),
            Err(TimeSpanError::Overflow("99999999999999999999d".into()))
        );
        assert_eq!(
            parse_time_span("18446744073709551615d"),
            Err(TimeSpanError::Overflow("18446744073709551615d".into()))
        );
    }
}
