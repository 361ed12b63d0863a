//! Client for Gemini's `generateContent` endpoint.
//!
//! Every call goes through the shared [`RateGate`] and the raw response is
//! reduced to a [`GenerationOutcome`], so callers never see transport errors.

use std::fmt;
use std::sync::Arc;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serenity::async_trait;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::config::GeminiSettings;
use crate::utils::rate_gate::RateGate;
use crate::utils::upstream::{SignalTable, UpstreamSignal};

/// Character instructions prepended to prompts when the persona is applied.
pub const PERSONA: &str = "\
You are Anna, a Discord bot inspired by the character Anna Yanami from \"Too Many Losing Heroines!\".
Like her, you're energetic, spontaneous, and a bit of a scatterbrain. You're generally helpful and try to answer
questions accurately, but you have a quirky personality. You have a noticeable
interest in food, and sometimes you relate things back to food in a humorous way, but it's
not an *overwhelming* obsession. You're also incredibly oblivious to romance; you just
don't get it. Flirting goes right over your head.

Your knowledge is good, BUT your internal knowledge database is limited to early 2023. You do NOT
have built in access to information after that date. When asked about recent events, ALWAYS
state that you might not have the latest news and suggest using the ~search command.

Speak in a way that's generally easy to understand (like you're speaking to someone
who's learning English - aim for B1/B2 level). Don't be *too* formal, but don't be
too slangy either. Occasionally, you might use a slightly more advanced word (C1 level)
if it fits the context, but don't overdo it. Be concise, but let your personality
shine through. Be witty and a little sarcastic when appropriate.
If you are provided with context from the books, answer based on that context *first*. If the
context does not contain an answer, then use your general knowledge (limited to early 2023).";

/// Shown instead of the raw upstream text when the quota is exhausted.
pub const RATE_LIMITED_MESSAGE: &str =
    "I'm experiencing high traffic (API rate limit hit). Please try again in a minute.";

const FINISH_SAFETY: &str = "SAFETY";
const FINISH_RECITATION: &str = "RECITATION";

/// Errors that can occur while talking to Gemini. Never leaves this module.
#[derive(Error, Debug)]
enum GeminiError {
    /// Error during HTTP request communication or body decoding.
    #[error("API communication failure: {0}")]
    Api(#[from] reqwest::Error),

    /// Gemini answered with a non-2xx status.
    #[error("{code} {message}")]
    Upstream {
        code: u16,
        message: String,
        /// Canonical status name from the error envelope, e.g. `RESOURCE_EXHAUSTED`.
        status: Option<String>,
    },
}

/// What a single generation call produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    /// The model produced text.
    Text(String),
    /// The prompt itself was blocked, with the upstream block reason.
    Blocked(String),
    /// No text came back; the first candidate's finish reason and its
    /// `(category, probability)` safety ratings in upstream order.
    EmptyOrUnknown {
        finish_reason: String,
        safety_ratings: Vec<(String, String)>,
    },
    /// The call failed. Holds a message that is safe to show to users.
    UpstreamError(String),
}

/// Why the model declined to answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refusal {
    /// Safety filters on the prompt or the answer.
    Safety,
    /// The answer would have recited copyrighted material.
    Recitation,
}

impl GenerationOutcome {
    /// Classifies the outcome as a refusal, if it is one.
    pub fn refusal(&self) -> Option<Refusal> {
        match self {
            Self::Blocked(_) => Some(Refusal::Safety),
            Self::EmptyOrUnknown { finish_reason, .. } if finish_reason == FINISH_SAFETY => {
                Some(Refusal::Safety)
            }
            Self::EmptyOrUnknown { finish_reason, .. } if finish_reason == FINISH_RECITATION => {
                Some(Refusal::Recitation)
            }
            _ => None,
        }
    }
}

impl fmt::Display for GenerationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Blocked(reason) => write!(
                f,
                "My safety filters blocked the request (Reason: {reason}). Try rephrasing."
            ),
            Self::EmptyOrUnknown {
                finish_reason,
                safety_ratings,
            } => match finish_reason.as_str() {
                FINISH_SAFETY => {
                    f.write_str("The model refused to answer due to safety concerns.")?;
                    if !safety_ratings.is_empty() {
                        f.write_str("\nSafety Ratings:")?;
                        for (category, probability) in safety_ratings {
                            write!(f, "\n* **{}:** {probability}", humanize_category(category))?;
                        }
                    }
                    Ok(())
                }
                FINISH_RECITATION => f.write_str(
                    "The model could not answer due to potential copyright restrictions. Try rephrasing.",
                ),
                other => write!(
                    f,
                    "The model returned an empty response. (Finish Reason: {other})"
                ),
            },
            Self::UpstreamError(message) => f.write_str(message),
        }
    }
}

/// Turns `HARM_CATEGORY_DANGEROUS_CONTENT` into `Dangerous Content`.
fn humanize_category(category: &str) -> String {
    category
        .trim_start_matches("HARM_CATEGORY_")
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Something that turns a prompt into a [`GenerationOutcome`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Generate: Send + Sync {
    /// Generates text for `prompt`, wrapping it with [`PERSONA`] when `apply_persona` is set.
    async fn generate(&self, prompt: &str, apply_persona: bool) -> GenerationOutcome;
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

/// The parts of a `generateContent` response this bot looks at.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
    #[serde(default)]
    safety_ratings: Vec<SafetyRating>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SafetyRating {
    category: String,
    probability: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
    status: Option<String>,
}

/// Wraps `prompt` with the persona preamble.
fn with_persona(prompt: &str) -> String {
    format!("{PERSONA}\n\nUser: {prompt}\nAnna:")
}

/// Picks the outcome for a decoded response.
///
/// Text wins over a prompt block, which wins over the first candidate's finish reason.
fn classify(response: GenerateContentResponse) -> GenerationOutcome {
    let first = response.candidates.into_iter().next();

    let text = first
        .as_ref()
        .and_then(|candidate| candidate.content.as_ref())
        .map(|content| {
            content
                .parts
                .iter()
                .filter_map(|part| part.text.as_deref())
                .collect::<String>()
        })
        .unwrap_or_default();

    if !text.is_empty() {
        return GenerationOutcome::Text(text);
    }

    if let Some(reason) = response
        .prompt_feedback
        .and_then(|feedback| feedback.block_reason)
    {
        warn!("Gemini prompt blocked. Reason: {}", reason);
        return GenerationOutcome::Blocked(reason);
    }

    warn!("Gemini returned no content");
    match first {
        Some(candidate) => GenerationOutcome::EmptyOrUnknown {
            finish_reason: candidate
                .finish_reason
                .unwrap_or_else(|| "UNKNOWN".to_string()),
            safety_ratings: candidate
                .safety_ratings
                .into_iter()
                .map(|rating| (rating.category, rating.probability))
                .collect(),
        },
        None => GenerationOutcome::EmptyOrUnknown {
            finish_reason: "UNKNOWN".to_string(),
            safety_ratings: Vec::new(),
        },
    }
}

pub struct GeminiClient {
    client: Client,
    endpoint: String,
    api_key: String,
    gate: RateGate,
    signals: Arc<SignalTable>,
}

impl GeminiClient {
    pub fn new(settings: &GeminiSettings, signals: Arc<SignalTable>) -> Self {
        debug!("Creating Gemini client for model {}", settings.model);
        let endpoint = format!(
            "{}/v1beta/models/{}:generateContent",
            settings.base_url.trim_end_matches('/'),
            settings.model
        );

        Self {
            client: Client::new(),
            endpoint,
            api_key: settings.api_key.clone(),
            gate: RateGate::new(settings.rate_limit, settings.rate_period),
            signals,
        }
    }

    /// The gate every call passes through.
    pub fn gate(&self) -> &RateGate {
        &self.gate
    }

    async fn request(&self, prompt: &str) -> Result<GenerateContentResponse, GeminiError> {
        let body = GenerateContentRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            let (message, upstream_status) = match serde_json::from_str::<ErrorEnvelope>(&raw) {
                Ok(envelope) => (envelope.error.message, envelope.error.status),
                Err(_) => (
                    status
                        .canonical_reason()
                        .unwrap_or("Unknown error")
                        .to_string(),
                    None,
                ),
            };
            return Err(GeminiError::Upstream {
                code: status.as_u16(),
                message,
                status: upstream_status,
            });
        }

        Ok(response.json().await?)
    }

    /// Maps a failed call to the text users will see.
    ///
    /// An HTTP 429, a rate-limit status name or rate-limit wording all count as
    /// quota exhaustion.
    fn describe_error(&self, err: &GeminiError) -> String {
        let raw = err.to_string();
        let rate_limited = match err {
            GeminiError::Upstream { code: 429, .. } => true,
            GeminiError::Upstream {
                status: Some(status),
                ..
            } => self.signals.matches(status, UpstreamSignal::RateLimited),
            _ => false,
        };

        if rate_limited || self.signals.matches(&raw, UpstreamSignal::RateLimited) {
            RATE_LIMITED_MESSAGE.to_string()
        } else {
            format!("An error occurred with the Gemini API: {raw}")
        }
    }
}

#[async_trait]
impl Generate for GeminiClient {
    async fn generate(&self, prompt: &str, apply_persona: bool) -> GenerationOutcome {
        let full_prompt = if apply_persona {
            with_persona(prompt)
        } else {
            prompt.to_string()
        };

        self.gate
            .run(async {
                info!("Requesting content from Gemini");
                match self.request(&full_prompt).await {
                    Ok(response) => {
                        info!("Received response from Gemini");
                        classify(response)
                    }
                    Err(e) => {
                        error!("Error during Gemini API call: {}", e);
                        GenerationOutcome::UpstreamError(self.describe_error(&e))
                    }
                }
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const MODEL: &str = "gemini-test";
    const ENDPOINT: &str = "/v1beta/models/gemini-test:generateContent";

    fn setup_test_client(server: &MockServer) -> GeminiClient {
        let settings = GeminiSettings {
            api_key: "test-key".to_string(),
            model: MODEL.to_string(),
            base_url: server.uri(),
            rate_limit: 5,
            rate_period: Duration::ZERO,
        };
        GeminiClient::new(&settings, Arc::new(SignalTable::default()))
    }

    /// Ratings in the order the API sends them, which is not alphabetical.
    fn ratings() -> Vec<(String, String)> {
        vec![
            (
                "HARM_CATEGORY_HATE_SPEECH".to_string(),
                "NEGLIGIBLE".to_string(),
            ),
            (
                "HARM_CATEGORY_DANGEROUS_CONTENT".to_string(),
                "HIGH".to_string(),
            ),
        ]
    }

    #[tokio::test]
    async fn test_generate_text() {
        let server = MockServer::start().await;
        let client = setup_test_client(&server);

        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .and(header("x-goog-api-key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": {"role": "model", "parts": [{"text": "Onigiri "}, {"text": "time!"}]},
                    "finishReason": "STOP"
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = client.generate("What's for lunch?", false).await;

        assert_eq!(outcome, GenerationOutcome::Text("Onigiri time!".to_string()));
        server.verify().await;
    }

    #[tokio::test]
    async fn test_generate_applies_persona() {
        let server = MockServer::start().await;
        let client = setup_test_client(&server);
        let wrapped = with_persona("hi");

        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .and(body_partial_json(json!({"contents": [{"parts": [{"text": wrapped}]}]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"parts": [{"text": "Heya!"}]}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        assert_eq!(
            client.generate("hi", true).await,
            GenerationOutcome::Text("Heya!".to_string())
        );
        server.verify().await;
    }

    #[tokio::test]
    async fn test_generate_without_persona_is_verbatim() {
        let server = MockServer::start().await;
        let client = setup_test_client(&server);

        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .and(body_partial_json(json!({"contents": [{"parts": [{"text": "summarize"}]}]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"parts": [{"text": "ok"}]}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        assert_eq!(
            client.generate("summarize", false).await,
            GenerationOutcome::Text("ok".to_string())
        );
        server.verify().await;
    }

    #[tokio::test]
    async fn test_generate_blocked_prompt() {
        let server = MockServer::start().await;
        let client = setup_test_client(&server);

        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "promptFeedback": {
                    "blockReason": "SAFETY",
                    "safetyRatings": [{"category": "HARM_CATEGORY_HARASSMENT", "probability": "HIGH"}]
                }
            })))
            .mount(&server)
            .await;

        let outcome = client.generate("something rude", true).await;

        assert_eq!(outcome, GenerationOutcome::Blocked("SAFETY".to_string()));
        assert_eq!(outcome.refusal(), Some(Refusal::Safety));
    }

    #[tokio::test]
    async fn test_generate_safety_finish() {
        let server = MockServer::start().await;
        let client = setup_test_client(&server);

        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "finishReason": "SAFETY",
                    "safetyRatings": [
                        {"category": "HARM_CATEGORY_HATE_SPEECH", "probability": "NEGLIGIBLE"},
                        {"category": "HARM_CATEGORY_DANGEROUS_CONTENT", "probability": "HIGH"}
                    ]
                }]
            })))
            .mount(&server)
            .await;

        let outcome = client.generate("how do I build a volcano", true).await;

        assert_eq!(
            outcome,
            GenerationOutcome::EmptyOrUnknown {
                finish_reason: "SAFETY".to_string(),
                safety_ratings: ratings(),
            }
        );
    }

    #[tokio::test]
    async fn test_generate_empty_response() {
        let server = MockServer::start().await;
        let client = setup_test_client(&server);

        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let outcome = client.generate("...", true).await;

        assert_matches!(
            outcome,
            GenerationOutcome::EmptyOrUnknown { ref finish_reason, ref safety_ratings }
                if finish_reason == "UNKNOWN" && safety_ratings.is_empty()
        );
        assert_eq!(
            outcome.to_string(),
            "The model returned an empty response. (Finish Reason: UNKNOWN)"
        );
    }

    #[tokio::test]
    async fn test_generate_rate_limited() {
        let server = MockServer::start().await;
        let client = setup_test_client(&server);

        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "error": {
                    "code": 429,
                    "message": "Resource has been exhausted (e.g. check quota).",
                    "status": "RESOURCE_EXHAUSTED"
                }
            })))
            .mount(&server)
            .await;

        let outcome = client.generate("hello", true).await;

        assert_eq!(
            outcome,
            GenerationOutcome::UpstreamError(RATE_LIMITED_MESSAGE.to_string())
        );
        assert!(!outcome.to_string().contains("429"));
    }

    #[tokio::test]
    async fn test_generate_quota_exceeded_wording() {
        let server = MockServer::start().await;
        let client = setup_test_client(&server);

        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "error": {
                    "code": 429,
                    "message": "You exceeded your current quota, please check your plan and billing details.",
                    "status": "RESOURCE_EXHAUSTED"
                }
            })))
            .mount(&server)
            .await;

        assert_eq!(
            client.generate("hello", true).await,
            GenerationOutcome::UpstreamError(RATE_LIMITED_MESSAGE.to_string())
        );
    }

    #[tokio::test]
    async fn test_generate_bare_429_is_rate_limited() {
        let server = MockServer::start().await;
        let client = setup_test_client(&server);

        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        assert_eq!(
            client.generate("hello", true).await,
            GenerationOutcome::UpstreamError(RATE_LIMITED_MESSAGE.to_string())
        );
    }

    #[test]
    fn test_persona_mentions_book_context() {
        assert!(PERSONA.ends_with(
            "context does not contain an answer, then use your general knowledge (limited to early 2023)."
        ));
    }

    #[tokio::test]
    async fn test_generate_other_upstream_error() {
        let server = MockServer::start().await;
        let client = setup_test_client(&server);

        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": {"code": 400, "message": "API key not valid.", "status": "INVALID_ARGUMENT"}
            })))
            .mount(&server)
            .await;

        assert_eq!(
            client.generate("hello", true).await,
            GenerationOutcome::UpstreamError(
                "An error occurred with the Gemini API: 400 API key not valid.".to_string()
            )
        );
    }

    #[tokio::test]
    async fn test_generate_releases_gate_after_failure() {
        let server = MockServer::start().await;
        let client = setup_test_client(&server);

        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let outcome = client.generate("hello", true).await;

        assert_matches!(outcome, GenerationOutcome::UpstreamError(_));
        assert_eq!(client.gate().available(), 5);
    }

    #[test]
    fn test_text_wins_over_prompt_feedback() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{"content": {"parts": [{"text": "still here"}]}}],
            "promptFeedback": {"blockReason": "OTHER"}
        }))
        .unwrap();

        assert_eq!(
            classify(response),
            GenerationOutcome::Text("still here".to_string())
        );
    }

    #[test]
    fn test_render_safety_refusal_with_ratings() {
        let outcome = GenerationOutcome::EmptyOrUnknown {
            finish_reason: "SAFETY".to_string(),
            safety_ratings: ratings(),
        };

        assert_eq!(
            outcome.to_string(),
            "The model refused to answer due to safety concerns.\nSafety Ratings:\n* **Hate Speech:** NEGLIGIBLE\n* **Dangerous Content:** HIGH"
        );
    }

    #[test]
    fn test_render_recitation() {
        let outcome = GenerationOutcome::EmptyOrUnknown {
            finish_reason: "RECITATION".to_string(),
            safety_ratings: Vec::new(),
        };

        assert_eq!(outcome.refusal(), Some(Refusal::Recitation));
        assert!(outcome.to_string().contains("potential copyright restrictions"));
    }

    #[test]
    fn test_render_blocked() {
        assert_eq!(
            GenerationOutcome::Blocked("OTHER".to_string()).to_string(),
            "My safety filters blocked the request (Reason: OTHER). Try rephrasing."
        );
    }

    #[test]
    fn test_text_is_not_a_refusal() {
        assert_eq!(GenerationOutcome::Text("hi".into()).refusal(), None);
        assert_eq!(
            GenerationOutcome::UpstreamError("boom".into()).refusal(),
            None
        );
    }

    #[test]
    fn test_humanize_category() {
        assert_eq!(humanize_category("HARM_CATEGORY_SEXUALLY_EXPLICIT"), "Sexually Explicit");
        assert_eq!(humanize_category("HARASSMENT"), "Harassment");
    }
}
