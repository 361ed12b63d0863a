mod common;

use std::collections::HashMap;
use std::time::Duration;

use assert_matches::assert_matches;
use pretty_assertions::assert_eq;
use rstest::{fixture, rstest};
use yanami::Data;
use yanami::config::{Config, ConfigError, DEFAULT_PREFIX};

#[fixture]
fn env() -> HashMap<&'static str, String> {
    common::init();
    common::base_env()
}

fn load(env: &HashMap<&'static str, String>) -> Result<Config, ConfigError> {
    Config::from_lookup(|key| env.get(key).cloned())
}

#[rstest]
fn test_gate_follows_configured_rate(mut env: HashMap<&'static str, String>) {
    env.insert("GEMINI_RATE_LIMIT", "4".to_string());
    env.insert("GEMINI_RATE_PERIOD", "1m".to_string());

    let data = Data::new(&load(&env).unwrap());

    assert_eq!(data.gemini.gate().capacity(), 4);
    assert_eq!(data.gemini.gate().cooldown(), Duration::from_secs(15));
    assert_eq!(data.gemini.gate().available(), 4);
}

#[rstest]
fn test_defaults_apply(env: HashMap<&'static str, String>) {
    let config = load(&env).unwrap();

    assert_eq!(config.prefix, DEFAULT_PREFIX);
    assert_eq!(config.gemini.rate_limit, 5);
    assert_eq!(config.search.timeout, Duration::from_secs(10));
    assert_eq!(config.announce_channel, None);
}

#[rstest]
#[case::discord("DISCORD_TOKEN")]
#[case::gemini("GOOGLE_API_KEY")]
#[case::search_key("GOOGLE_SEARCH_API_KEY")]
#[case::engine("SEARCH_ENGINE_ID")]
fn test_required_keys(mut env: HashMap<&'static str, String>, #[case] key: &'static str) {
    env.remove(key);

    assert_matches!(load(&env), Err(ConfigError::Missing(missing)) if missing == key);
}

#[rstest]
#[case::zero_rate("GEMINI_RATE_LIMIT", "0")]
#[case::word_rate("GEMINI_RATE_LIMIT", "five")]
#[case::bad_period("GEMINI_RATE_PERIOD", "soon")]
#[case::bad_channel("ANNOUNCE_CHANNEL_ID", "general")]
fn test_invalid_values(
    mut env: HashMap<&'static str, String>,
    #[case] key: &'static str,
    #[case] value: &str,
) {
    env.insert(key, value.to_string());

    assert_matches!(load(&env), Err(ConfigError::Invalid { key: invalid, .. }) if invalid == key);
}
