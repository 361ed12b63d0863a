//! Process-wide configuration, read once from the environment at start-up.
//!
//! Everything here is built before the framework starts and handed to the
//! clients by reference, so no client reads the environment on its own.

use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::de::value::{Error as ValueError, StrDeserializer};
use thiserror::Error;
use tracing::{debug, warn};

use crate::utils::upstream::SignalTable;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_GEMINI_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_SEARCH_URL: &str = "https://www.googleapis.com/customsearch/v1";
pub const DEFAULT_WOLFRAM_SHORT_URL: &str = "https://api.wolframalpha.com/v1/result";
pub const DEFAULT_WOLFRAM_FULL_URL: &str = "https://api.wolframalpha.com/v2/query";
pub const DEFAULT_PREFIX: &str = "~";

/// Errors raised while reading the configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required variable is not set.
    #[error("Missing {0}")]
    Missing(&'static str),

    /// A variable is set but cannot be used.
    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Settings for the Gemini client and its rate gate.
#[derive(Debug, Clone)]
pub struct GeminiSettings {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    /// Calls allowed in flight at once.
    pub rate_limit: usize,
    /// Window the rate limit is spread over.
    pub rate_period: Duration,
}

/// Settings for the Google Custom Search client.
#[derive(Debug, Clone)]
pub struct SearchSettings {
    pub api_key: String,
    pub engine_id: String,
    pub url: String,
    pub timeout: Duration,
}

/// Settings for both Wolfram|Alpha tiers. A tier without an app id always fails over.
#[derive(Debug, Clone)]
pub struct WolframSettings {
    pub short_appid: Option<String>,
    pub full_appid: Option<String>,
    pub short_url: String,
    pub full_url: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: String,
    pub prefix: String,
    /// Channel that receives the start-up greeting.
    pub announce_channel: Option<u64>,
    pub gemini: GeminiSettings,
    pub search: SearchSettings,
    pub wolfram: WolframSettings,
    pub signals: Arc<SignalTable>,
}

impl Config {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, which returns `None` for unset keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let required = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));
        let or_default = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let gemini = GeminiSettings {
            api_key: required("GOOGLE_API_KEY")?,
            model: or_default("GEMINI_MODEL", DEFAULT_GEMINI_MODEL),
            base_url: or_default("GEMINI_BASE_URL", DEFAULT_GEMINI_URL),
            rate_limit: parse_or("GEMINI_RATE_LIMIT", get("GEMINI_RATE_LIMIT"), 5)?,
            rate_period: duration_or(
                "GEMINI_RATE_PERIOD",
                get("GEMINI_RATE_PERIOD"),
                Duration::from_secs(60),
            )?,
        };
        if gemini.rate_limit == 0 {
            return Err(ConfigError::Invalid {
                key: "GEMINI_RATE_LIMIT",
                reason: "must be at least 1".to_string(),
            });
        }

        let search = SearchSettings {
            api_key: required("GOOGLE_SEARCH_API_KEY")?,
            engine_id: required("SEARCH_ENGINE_ID")?,
            url: or_default("GOOGLE_SEARCH_URL", DEFAULT_SEARCH_URL),
            timeout: duration_or(
                "SEARCH_TIMEOUT",
                get("SEARCH_TIMEOUT"),
                Duration::from_secs(10),
            )?,
        };

        let wolfram = WolframSettings {
            short_appid: get("WOLFRAM_APPID_SHORT"),
            full_appid: get("WOLFRAM_APPID_FULL"),
            short_url: or_default("WOLFRAM_SHORT_URL", DEFAULT_WOLFRAM_SHORT_URL),
            full_url: or_default("WOLFRAM_FULL_URL", DEFAULT_WOLFRAM_FULL_URL),
        };
        if wolfram.short_appid.is_none() || wolfram.full_appid.is_none() {
            warn!("Wolfram|Alpha app ids are incomplete, math answers may be unavailable");
        }

        let announce_channel = get("ANNOUNCE_CHANNEL_ID")
            .map(|raw| parse("ANNOUNCE_CHANNEL_ID", &raw))
            .transpose()?;

        let config = Self {
            discord_token: required("DISCORD_TOKEN")?,
            prefix: or_default("BOT_PREFIX", DEFAULT_PREFIX),
            announce_channel,
            gemini,
            search,
            wolfram,
            signals: Arc::new(SignalTable::default()),
        };

        debug!(
            "Loaded configuration: model={}, rate={} per {:?}, search timeout={:?}",
            config.gemini.model,
            config.gemini.rate_limit,
            config.gemini.rate_period,
            config.search.timeout
        );

        Ok(config)
    }
}

fn parse<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        reason: e.to_string(),
    })
}

fn parse_or<T>(key: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    raw.map_or(Ok(default), |raw| parse(key, &raw))
}

/// Reads a humantime duration such as `60s` or `1m 30s`.
fn duration_or(
    key: &'static str,
    raw: Option<String>,
    default: Duration,
) -> Result<Duration, ConfigError> {
    let Some(raw) = raw else {
        return Ok(default);
    };

    humantime_serde::deserialize(StrDeserializer::<ValueError>::new(raw.trim())).map_err(
        |e: ValueError| ConfigError::Invalid {
            key,
            reason: e.to_string(),
        },
    )
}
