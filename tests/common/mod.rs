//! Shared setup for the integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Once;

use tracing::Level;
use yanami::config::Config;

static INIT: Once = Once::new();

/// Installs a test-friendly tracing subscriber once per test binary.
pub fn init() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(Level::DEBUG)
            .with_test_writer()
            .init();
    });
}

/// The minimum set of variables the bot starts with.
pub fn base_env() -> HashMap<&'static str, String> {
    HashMap::from([
        ("DISCORD_TOKEN", "discord-token".to_string()),
        ("GOOGLE_API_KEY", "gemini-key".to_string()),
        ("GOOGLE_SEARCH_API_KEY", "search-key".to_string()),
        ("SEARCH_ENGINE_ID", "engine-id".to_string()),
    ])
}

/// A configuration whose upstream services all live under `base` (a mock server uri).
pub fn config_for(base: &str) -> Config {
    let mut env = base_env();
    env.extend([
        ("GEMINI_MODEL", "gemini-test".to_string()),
        ("GEMINI_BASE_URL", base.to_string()),
        ("GEMINI_RATE_PERIOD", "0s".to_string()),
        ("GOOGLE_SEARCH_URL", format!("{base}/customsearch/v1")),
        ("SEARCH_TIMEOUT", "200ms".to_string()),
        ("WOLFRAM_APPID_SHORT", "short-id".to_string()),
        ("WOLFRAM_APPID_FULL", "full-id".to_string()),
        ("WOLFRAM_SHORT_URL", format!("{base}/v1/result")),
        ("WOLFRAM_FULL_URL", format!("{base}/v2/query")),
    ]);

    Config::from_lookup(|key| env.get(key).cloned()).expect("test configuration is valid")
}
