//! This module aggregates the clients and helpers used by the commands.

/// Client for the Gemini generative-language API.
pub mod gemini;
/// Client for the Google Custom Search JSON API.
pub mod google_search;
/// Concurrency gate in front of the Gemini API.
pub mod rate_gate;
/// Text cleanup and truncation for Discord output.
pub mod text;
/// Parsing of `10s` / `5m` / `1h` / `2d` style durations.
pub mod time_span;
/// Central table of upstream failure wording.
pub mod upstream;
/// Tiered Wolfram|Alpha client.
#[cfg(feature = "wolfram")]
pub mod wolfram;
