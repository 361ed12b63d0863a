//! Utilities for interacting with the Google Custom Search JSON API.
//! Requires `GOOGLE_SEARCH_API_KEY` and `SEARCH_ENGINE_ID`.

use std::fmt;

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serenity::async_trait;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::config::SearchSettings;

/// Number of results requested when the caller does not say otherwise.
pub const DEFAULT_NUM_RESULTS: u8 = 5;

/// Errors that can occur during Custom Search API interactions.
#[derive(Error, Debug)]
enum SearchError {
    /// Error during HTTP request communication or body decoding.
    #[error("API communication failure: {0}")]
    Api(#[from] reqwest::Error),

    /// The API returned an error envelope.
    #[error("{0}")]
    Upstream(String),

    /// A non-2xx response without a readable error envelope.
    #[error("HTTP status {0}")]
    Status(StatusCode),
}

/// The shape of a Custom Search response that this bot reads.
#[derive(Debug, Default, Deserialize)]
pub struct SearchResponse {
    /// Present when the API rejected the request.
    #[serde(default)]
    pub error: Option<ApiError>,
    /// Search hits, absent when nothing matched.
    #[serde(default)]
    pub items: Option<Vec<SearchItem>>,
}

#[derive(Debug, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub message: Option<String>,
}

/// A single item as the API returns it.
#[derive(Debug, Deserialize)]
pub struct SearchItem {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub snippet: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
}

/// A search hit ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub title: String,
    pub snippet: String,
    pub link: String,
}

impl From<SearchItem> for SearchHit {
    fn from(item: SearchItem) -> Self {
        Self {
            title: item.title.unwrap_or_else(|| "No Title".to_string()),
            snippet: item
                .snippet
                .unwrap_or_else(|| "No snippet available.".to_string())
                .replace('\n', " "),
            link: item.link.unwrap_or_else(|| "#".to_string()),
        }
    }
}

/// What a single search call produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Hits in upstream order.
    Results(Vec<SearchHit>),
    NoResults,
    Error(String),
    Timeout,
}

impl fmt::Display for SearchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Results(hits) => f.write_str(&format_search_results(hits)),
            Self::NoResults => f.write_str("No relevant results found."),
            Self::Error(message) => f.write_str(message),
            Self::Timeout => f.write_str("Search timed out."),
        }
    }
}

/// Formats hits one per line as `**title**: snippet (link)`.
pub fn format_search_results(hits: &[SearchHit]) -> String {
    hits.iter()
        .map(|hit| format!("**{}**: {} ({})", hit.title, hit.snippet, hit.link))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Something that can run a web search.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WebSearch: Send + Sync {
    async fn search(&self, query: &str, num_results: u8) -> SearchOutcome;
}

pub struct GoogleSearchClient {
    client: Client,
    settings: SearchSettings,
}

impl GoogleSearchClient {
    pub fn new(settings: &SearchSettings) -> Self {
        Self {
            client: Client::new(),
            settings: settings.clone(),
        }
    }

    async fn fetch(&self, query: &str, num_results: u8) -> Result<Vec<SearchItem>, SearchError> {
        let num = num_results.to_string();
        let response = self
            .client
            .get(&self.settings.url)
            .query(&[
                ("key", self.settings.api_key.as_str()),
                ("cx", self.settings.engine_id.as_str()),
                ("q", query),
                ("num", num.as_str()),
            ])
            .header("Accept", "application/json")
            .timeout(self.settings.timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            return Err(serde_json::from_str::<SearchResponse>(&raw)
                .ok()
                .and_then(|body| body.error)
                .and_then(|api_error| api_error.message)
                .map_or(SearchError::Status(status), SearchError::Upstream));
        }

        let body: SearchResponse = response.json().await?;

        if let Some(api_error) = body.error {
            let message = api_error
                .message
                .unwrap_or_else(|| "Unknown Google API error".to_string());
            return Err(SearchError::Upstream(message));
        }

        Ok(body.items.unwrap_or_default())
    }
}

#[async_trait]
impl WebSearch for GoogleSearchClient {
    async fn search(&self, query: &str, num_results: u8) -> SearchOutcome {
        info!("Performing Google Custom Search for: {}", query);

        match self.fetch(query, num_results).await {
            Ok(items) if items.is_empty() => {
                info!("No Google Custom Search results found for query: {}", query);
                SearchOutcome::NoResults
            }
            Ok(items) => {
                info!("Found {} Google Custom Search results", items.len());
                SearchOutcome::Results(items.into_iter().map(SearchHit::from).collect())
            }
            Err(SearchError::Api(e)) if e.is_timeout() => {
                warn!("Google Custom Search timed out for query: {}", query);
                SearchOutcome::Timeout
            }
            Err(SearchError::Upstream(message)) => {
                error!("Google Custom Search API error: {}", message);
                SearchOutcome::Error(format!("Search API error: {message}"))
            }
            Err(e) => {
                // reqwest errors carry the request url, which holds the api key.
                let e = match e {
                    SearchError::Api(e) => SearchError::Api(e.without_url()),
                    other => other,
                };
                error!("Error during Google Custom Search request: {}", e);
                SearchOutcome::Error(format!(
                    "Error communicating with the search service: {e}"
                ))
            }
        }
    }
}
