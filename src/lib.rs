//! Anna, a Discord bot that answers with Gemini, searches with Google and
//! does maths with Wolfram|Alpha, plus a handful of moderation commands.

use tracing::info;

pub mod commands;
pub mod config;
pub mod events;
pub mod utils;

use config::Config;
use utils::gemini::GeminiClient;
use utils::google_search::GoogleSearchClient;
#[cfg(feature = "wolfram")]
use utils::wolfram::WolframClient;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;
pub type CommandResult = Result<(), Error>;

/// Shared state handed to every command invocation.
///
/// Built once from [`Config`] in the framework setup. The Gemini client owns the
/// only piece of cross-request state, its rate gate.
pub struct Data {
    pub gemini: GeminiClient,
    pub search: GoogleSearchClient,
    #[cfg(feature = "wolfram")]
    pub wolfram: WolframClient,
}

impl Data {
    pub fn new(config: &Config) -> Self {
        info!(
            "Rate limit set to {} requests per {:?}",
            config.gemini.rate_limit, config.gemini.rate_period
        );

        Self {
            gemini: GeminiClient::new(&config.gemini, config.signals.clone()),
            search: GoogleSearchClient::new(&config.search),
            #[cfg(feature = "wolfram")]
            wolfram: WolframClient::new(&config.wolfram, config.signals.clone()),
        }
    }
}
