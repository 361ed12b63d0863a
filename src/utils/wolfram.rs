//! Wolfram|Alpha client with a short-answer tier and a full-results fallback.

use std::sync::Arc;

use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::WolframSettings;
use crate::utils::upstream::{SignalTable, UpstreamSignal};

/// Errors from a single tier. Only logged, never shown to users.
#[derive(Error, Debug)]
enum WolframError {
    #[error("API communication failure: {0}")]
    Api(#[from] reqwest::Error),

    #[error("No app id configured for the {0} tier")]
    MissingAppId(&'static str),

    #[error("Unexpected status {0}")]
    Status(reqwest::StatusCode),
}

/// Which endpoint produced an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathTier {
    ShortAnswer,
    FullResults,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MathAnswer {
    pub text: String,
    pub tier: MathTier,
}

/// `None` means neither tier had an answer.
pub type MathOutcome = Option<MathAnswer>;

pub struct WolframClient {
    client: Client,
    settings: WolframSettings,
    signals: Arc<SignalTable>,
}

impl WolframClient {
    pub fn new(settings: &WolframSettings, signals: Arc<SignalTable>) -> Self {
        Self {
            client: Client::new(),
            settings: settings.clone(),
            signals,
        }
    }

    /// Asks the short-answer endpoint first and falls back to full results when it
    /// fails, comes back empty, or says it did not understand the query.
    pub async fn solve(&self, query: &str) -> MathOutcome {
        info!("Solving math query: {}", query);

        match self.short_answer(query).await {
            Ok(text) if !self.signals.matches(&text, UpstreamSignal::NotUnderstood) => {
                debug!("Short answer tier answered");
                return Some(MathAnswer {
                    text,
                    tier: MathTier::ShortAnswer,
                });
            }
            Ok(text) => debug!("Short answer tier did not understand: {}", text),
            Err(e) => warn!("Short answer tier failed: {}", e),
        }

        match self.full_results(query).await {
            Ok(Some(text)) => Some(MathAnswer {
                text,
                tier: MathTier::FullResults,
            }),
            Ok(None) => {
                info!("No answer from either tier for: {}", query);
                None
            }
            Err(e) => {
                warn!("Full results tier failed: {}", e);
                None
            }
        }
    }

    async fn short_answer(&self, query: &str) -> Result<String, WolframError> {
        let appid = self
            .settings
            .short_appid
            .as_deref()
            .ok_or(WolframError::MissingAppId("short answer"))?;

        let response = self
            .client
            .get(&self.settings.short_url)
            .query(&[("appid", appid), ("i", query), ("units", "metric")])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(WolframError::Status(response.status()));
        }

        let text = response.text().await?.trim().to_string();
        if text.is_empty() {
            return Err(WolframError::Status(reqwest::StatusCode::NO_CONTENT));
        }
        Ok(text)
    }

    async fn full_results(&self, query: &str) -> Result<Option<String>, WolframError> {
        let appid = self
            .settings
            .full_appid
            .as_deref()
            .ok_or(WolframError::MissingAppId("full results"))?;

        let response = self
            .client
            .get(&self.settings.full_url)
            .query(&[
                ("appid", appid),
                ("input", query),
                ("format", "plaintext"),
                ("output", "JSON"),
                ("units", "metric"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(WolframError::Status(response.status()));
        }

        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.contains("json"));
        let body = response.text().await?;

        Ok(extract_full_text(&body, is_json))
    }
}

/// Pulls display text out of a full-results body.
///
/// JSON bodies give either a top-level `result` or the plaintext of every subpod;
/// anything else is used as-is.
fn extract_full_text(body: &str, is_json: bool) -> Option<String> {
    let text = if is_json {
        let value: Value = serde_json::from_str(body).ok()?;

        match value.get("result").and_then(Value::as_str) {
            Some(result) => result.to_string(),
            None => value
                .pointer("/queryresult/pods")
                .and_then(Value::as_array)
                .into_iter()
                .flatten()
                .filter_map(|pod| pod.get("subpods").and_then(Value::as_array))
                .flatten()
                .filter_map(|subpod| subpod.get("plaintext").and_then(Value::as_str))
                .filter(|text| !text.is_empty())
                .collect::<Vec<_>>()
                .join("\n"),
        }
    } else {
        body.to_string()
    };

    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}
