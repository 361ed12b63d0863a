//! Commands backed by Gemini, with Google Custom Search for fresh information.

/// Submodule defining the `ask` / `write` command.
pub(crate) mod ask;
/// Submodule defining the `search` command.
pub(crate) mod search;

use tracing::info;
use url::Url;

use crate::utils::gemini::{Generate, GenerationOutcome, Refusal};
use crate::utils::google_search::{
    DEFAULT_NUM_RESULTS, SearchOutcome, WebSearch, format_search_results,
};
use crate::utils::text::{DEFAULT_MAX_LENGTH, format_response, truncate};

/// How many links a refusal fallback offers.
const FALLBACK_LINKS: usize = 3;

/// How much of a user's query is echoed back in titles, replies and links.
///
/// Keeps embed titles under 256 characters and the Google link under the
/// 1024-character field limit even when every character is percent-encoded.
const QUERY_PREVIEW_LENGTH: usize = 100;

/// The query as it is echoed back to the user.
fn query_preview(query: &str) -> String {
    truncate(query, QUERY_PREVIEW_LENGTH)
}

/// What the `search` command ends up showing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchSummary {
    /// A formatted and truncated summary of the hits.
    Summary(String),
    /// Nothing usable came back; the reply to send instead.
    Unavailable(String),
}

/// Searches for `query` and has Gemini summarize the hits, persona off.
pub async fn summarize_search<G, S>(generator: &G, searcher: &S, query: &str) -> SearchSummary
where
    G: Generate + ?Sized,
    S: WebSearch + ?Sized,
{
    let hits = match searcher.search(query, DEFAULT_NUM_RESULTS).await {
        SearchOutcome::Results(hits) => hits,
        other => {
            let reason = match other {
                SearchOutcome::Error(message) => format!(" ({message})"),
                _ => String::new(),
            };
            let reply = format!(
                "Couldn't find useful results for '{}'{reason}. Maybe try different keywords?",
                query_preview(query)
            );
            return SearchSummary::Unavailable(truncate(&reply, DEFAULT_MAX_LENGTH));
        }
    };

    let prompt = format!(
        "Based *only* on the following search results, provide a concise summary answering the query: '{query}'\n\nSearch Results:\n{}\n\nSummary:",
        format_search_results(&hits)
    );
    info!("Requesting summarization from Gemini");
    let summary = generator.generate(&prompt, false).await;

    SearchSummary::Summary(truncate(
        &format_response(&summary.to_string()),
        DEFAULT_MAX_LENGTH,
    ))
}

/// The web query to try when the model declined to answer `query`.
///
/// Returns `None` when the outcome is not a refusal.
pub fn fallback_query(outcome: &GenerationOutcome, query: &str) -> Option<String> {
    match outcome.refusal()? {
        Refusal::Recitation if query.to_lowercase().contains("recipe") => {
            Some(format!("{query} recipe"))
        }
        Refusal::Recitation | Refusal::Safety => Some(query.to_string()),
    }
}

/// Text appended to a refused answer after searching.
pub fn fallback_links(outcome: &SearchOutcome) -> String {
    match outcome {
        SearchOutcome::Results(hits) => {
            let links = hits
                .iter()
                .filter(|hit| hit.link.starts_with("http://") || hit.link.starts_with("https://"))
                .take(FALLBACK_LINKS)
                .map(|hit| format!("- <{}>", hit.link))
                .collect::<Vec<_>>();

            if links.is_empty() {
                String::new()
            } else {
                format!("\n\nMaybe these links will help?\n{}", links.join("\n"))
            }
        }
        _ => "\n\nI tried searching, but couldn't find helpful links either.".to_string(),
    }
}

/// Link to the same query on google.com, cut to the first [`QUERY_PREVIEW_LENGTH`] characters.
pub fn google_link(query: &str) -> String {
    let query: String = query.chars().take(QUERY_PREVIEW_LENGTH).collect();
    Url::parse_with_params("https://www.google.com/search", &[("q", query.as_str())])
        .map(String::from)
        .unwrap_or_else(|_| "https://www.google.com/".to_string())
}
