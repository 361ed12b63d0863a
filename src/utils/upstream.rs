//! A single table that recognises failure kinds from upstream wording.
//!
//! Neither Gemini nor Wolfram|Alpha hand us structured error codes at every
//! boundary, so a few failure kinds can only be told apart by the text that
//! comes back. All of those patterns live here instead of at the call sites.

use regex::Regex;
use tracing::debug;

/// A failure kind recognised from upstream text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamSignal {
    /// The provider's quota is exhausted (HTTP 429 style).
    RateLimited,
    /// The provider could not interpret the input.
    NotUnderstood,
}

/// Ordered `(pattern, signal)` rules. The first matching rule wins.
#[derive(Debug, Clone)]
pub struct SignalTable {
    rules: Vec<(Regex, UpstreamSignal)>,
}

impl SignalTable {
    /// Builds a table from raw patterns. Patterns are matched case-insensitively.
    pub fn new<'a, I>(rules: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = (&'a str, UpstreamSignal)>,
    {
        let rules = rules
            .into_iter()
            .map(|(pattern, signal)| Ok((Regex::new(&format!("(?i){pattern}"))?, signal)))
            .collect::<Result<Vec<_>, regex::Error>>()?;

        Ok(Self { rules })
    }

    /// Returns the signal of the first rule that matches `text`.
    pub fn classify(&self, text: &str) -> Option<UpstreamSignal> {
        let signal = self
            .rules
            .iter()
            .find(|(pattern, _)| pattern.is_match(text))
            .map(|(_, signal)| *signal);

        if let Some(signal) = signal {
            debug!("Upstream text classified as {:?}", signal);
        }
        signal
    }

    /// Whether `text` carries the given signal.
    pub fn matches(&self, text: &str, signal: UpstreamSignal) -> bool {
        self.classify(text) == Some(signal)
    }
}

impl Default for SignalTable {
    fn default() -> Self {
        Self::new([
            (r"429 resource has been exhausted", UpstreamSignal::RateLimited),
            (r"resource_exhausted", UpstreamSignal::RateLimited),
            (r"did not understand", UpstreamSignal::NotUnderstood),
        ])
        .expect("built-in upstream patterns are valid")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("429 Resource has been exhausted (e.g. check quota).", Some(UpstreamSignal::RateLimited) ; "gemini 429 text")]
    #[test_case("RESOURCE_EXHAUSTED", Some(UpstreamSignal::RateLimited) ; "status name")]
    #[test_case("Wolfram|Alpha did not understand your input", Some(UpstreamSignal::NotUnderstood) ; "wolfram")]
    #[test_case("WOLFRAM|ALPHA DID NOT UNDERSTAND YOUR INPUT", Some(UpstreamSignal::NotUnderstood) ; "case insensitive")]
    #[test_case("500 Internal error encountered.", None ; "unrelated")]
    #[test_case("", None ; "empty")]
    fn test_default_table(text: &str, expected: Option<UpstreamSignal>) {
        assert_eq!(SignalTable::default().classify(text), expected);
    }

    #[test]
    fn test_first_rule_wins() {
        let table = SignalTable::new([
            ("quota", UpstreamSignal::RateLimited),
            ("quota", UpstreamSignal::NotUnderstood),
        ])
        .unwrap();

        assert_eq!(table.classify("Quota exceeded"), Some(UpstreamSignal::RateLimited));
        assert!(table.matches("quota", UpstreamSignal::RateLimited));
        assert!(!table.matches("quota", UpstreamSignal::NotUnderstood));
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        assert!(SignalTable::new([("(unclosed", UpstreamSignal::RateLimited)]).is_err());
    }
}
