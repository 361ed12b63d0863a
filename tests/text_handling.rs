use std::time::Duration;

use test_case::test_case;
use yanami::utils::text::{DEFAULT_MAX_LENGTH, format_response, truncate};
use yanami::utils::time_span::{TimeSpanError, parse_time_span};

#[test]
fn test_long_formatted_reply_fits_in_a_message() {
    let reply = format!("* Step one: boil   water\n{}", "noodles ".repeat(400));

    let shown = truncate(&format_response(&reply), DEFAULT_MAX_LENGTH);

    assert!(shown.starts_with("** Step one:** boil water\n"), "{shown}");
    pretty_assertions::assert_eq!(shown.chars().count(), DEFAULT_MAX_LENGTH + "...".len());
    assert!(shown.ends_with("..."));
}

#[test_case("45s" => Ok(Duration::from_secs(45)) ; "seconds")]
#[test_case("2H" => Ok(Duration::from_secs(7200)) ; "uppercase unit")]
#[test_case("1h30m" => Err(TimeSpanError::Malformed("1h30m".to_string())) ; "compound")]
#[test_case("" => Err(TimeSpanError::Malformed(String::new())) ; "empty")]
fn test_public_time_span(token: &str) -> Result<Duration, TimeSpanError> {
    parse_time_span(token)
}
