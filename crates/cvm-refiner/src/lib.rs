//! HTTP client for the AI refinement provider.
//!
//! Speaks the OpenAI-compatible chat-completions protocol (the hosted service
//! behind the extraction pipeline exposes both an OpenAI and an Azure OpenAI
//! flavor), asks for strict JSON and implements [`Refiner`] so the match
//! engine stays unaware of the wire format.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use cvm_common::matching::{MatchResult, ScoreComponents};
use cvm_common::refine::{RefineError, RefinedEvaluation, Refiner};
use cvm_common::{CandidateProfile, JobProfile};

const SYSTEM_PROMPT: &str = "Eres un experto en reclutamiento. Ajusta el score del candidato \
basado en criterios técnicos, experiencia, educación y habilidades. Devuelve SOLO JSON válido con:\n\
{ match_score, strengths, gaps, justification }";

#[derive(Debug, Clone)]
pub struct RefinerConfig {
    pub provider: String,
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
    pub timeout: Duration,
    pub max_retries: u32,
    pub retry_backoff: Duration,
}

impl Default for RefinerConfig {
    fn default() -> Self {
        let (model, endpoint) = provider_defaults("openai");
        Self {
            provider: "openai".into(),
            endpoint,
            api_key: String::new(),
            model,
            timeout: Duration::from_secs(30),
            max_retries: 3,
            retry_backoff: Duration::from_secs(5),
        }
    }
}

fn provider_defaults(provider: &str) -> (String, String) {
    match provider.to_ascii_lowercase().as_str() {
        // Azure deployments have per-resource URLs; the endpoint must come
        // from configuration.
        "azure" => ("gpt-4".into(), String::new()),
        _ => (
            "gpt-4o-mini".into(),
            "https://api.openai.com/v1/chat/completions".into(),
        ),
    }
}

fn provider_api_key(provider: &str) -> Option<String> {
    match provider.to_ascii_lowercase().as_str() {
        "azure" => std::env::var("AZURE_OPENAI_KEY").ok(),
        _ => std::env::var("OPENAI_API_KEY").ok(),
    }
}

impl RefinerConfig {
    /// Read the provider configuration from `REFINER_*` variables, falling
    /// back to the provider's conventional key variable and defaults.
    pub fn from_env() -> Self {
        fn parse_u64(key: &str, default: u64) -> u64 {
            std::env::var(key)
                .ok()
                .and_then(|raw| raw.parse::<u64>().ok())
                .unwrap_or(default)
        }

        fn parse_u32(key: &str, default: u32) -> u32 {
            std::env::var(key)
                .ok()
                .and_then(|raw| raw.parse::<u32>().ok())
                .unwrap_or(default)
        }

        let provider = std::env::var("REFINER_PROVIDER").unwrap_or_else(|_| "openai".into());
        let (default_model, default_endpoint) = provider_defaults(&provider);

        let api_key = std::env::var("REFINER_API_KEY")
            .ok()
            .or_else(|| provider_api_key(&provider))
            .unwrap_or_default();

        Self {
            provider,
            endpoint: std::env::var("REFINER_ENDPOINT").unwrap_or(default_endpoint),
            api_key,
            model: std::env::var("REFINER_MODEL").unwrap_or(default_model),
            timeout: Duration::from_secs(parse_u64("REFINER_TIMEOUT_SECONDS", 30)),
            max_retries: parse_u32("REFINER_MAX_RETRIES", 3),
            retry_backoff: Duration::from_secs(parse_u64("REFINER_RETRY_BACKOFF_SECONDS", 5)),
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

/// The payload the provider reasons over: both profiles plus the heuristic
/// evaluation it is asked to adjust. The candidate back-reference is omitted
/// from the base evaluation to avoid sending the profile twice.
#[derive(Serialize)]
struct RefinePayload<'a> {
    job_profile: &'a JobProfile,
    candidate_profile: &'a CandidateProfile,
    base_evaluation: BaseEvaluation<'a>,
}

#[derive(Serialize)]
struct BaseEvaluation<'a> {
    match_score: u8,
    base_components: ScoreComponents,
    strengths: &'a [String],
    gaps: &'a [String],
}

pub struct HttpRefiner {
    client: reqwest::Client,
    config: RefinerConfig,
}

impl HttpRefiner {
    pub fn new(config: RefinerConfig) -> Result<Self, RefineError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| RefineError::Transport(err.to_string()))?;
        Ok(Self { client, config })
    }

    async fn call_provider(&self, user_content: &str) -> Result<String, RefineError> {
        let request_body = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: user_content,
                },
            ],
            response_format: ResponseFormat {
                format_type: "json_object",
            },
        };

        let mut last_error: Option<RefineError> = None;

        for attempt in 0..self.config.max_retries {
            if attempt > 0 {
                warn!(
                    attempt,
                    backoff_secs = self.config.retry_backoff.as_secs(),
                    "provider call failed, retrying"
                );
                tokio::time::sleep(self.config.retry_backoff).await;
            }

            let mut request = self
                .client
                .post(self.config.endpoint.as_str())
                .json(&request_body);
            request = if self.config.provider.eq_ignore_ascii_case("azure") {
                request.header("api-key", &self.config.api_key)
            } else {
                request.bearer_auth(&self.config.api_key)
            };

            let response = match request.send().await {
                Ok(response) => response,
                Err(err) => {
                    last_error = Some(RefineError::Transport(err.to_string()));
                    continue;
                }
            };

            let status = response.status();
            if status.as_u16() == 429 || status.is_server_error() {
                let message = response.text().await.unwrap_or_default();
                last_error = Some(RefineError::Provider {
                    status: status.as_u16(),
                    message,
                });
                continue;
            }

            if !status.is_success() {
                let message = response.text().await.unwrap_or_default();
                return Err(RefineError::Provider {
                    status: status.as_u16(),
                    message,
                });
            }

            let reply: Value = response
                .json()
                .await
                .map_err(|err| RefineError::MalformedReply(err.to_string()))?;

            let content = reply
                .pointer("/choices/0/message/content")
                .and_then(Value::as_str)
                .ok_or(RefineError::EmptyContent)?;

            debug!(model = %self.config.model, "provider call succeeded");
            return Ok(content.to_string());
        }

        Err(last_error.unwrap_or(RefineError::Transport("no attempts made".into())))
    }
}

#[async_trait]
impl Refiner for HttpRefiner {
    async fn refine(
        &self,
        job: &JobProfile,
        candidate: &CandidateProfile,
        base: &MatchResult,
    ) -> Result<RefinedEvaluation, RefineError> {
        let payload = RefinePayload {
            job_profile: job,
            candidate_profile: candidate,
            base_evaluation: BaseEvaluation {
                match_score: base.match_score,
                base_components: base.base_components,
                strengths: &base.strengths,
                gaps: &base.gaps,
            },
        };
        let user_content = serde_json::to_string_pretty(&payload)
            .map_err(|err| RefineError::MalformedReply(err.to_string()))?;

        let content = self.call_provider(&user_content).await?;
        parse_refined(&content)
    }
}

/// Parse the provider's reply into a [`RefinedEvaluation`].
///
/// Tolerant on shape the way recruiters' models actually answer: fences are
/// stripped, the score may arrive as a number or a numeric string, and the
/// message lists are optional. A reply without a usable score is an error.
pub fn parse_refined(content: &str) -> Result<RefinedEvaluation, RefineError> {
    let text = strip_json_fences(content);
    let raw: Value =
        serde_json::from_str(text).map_err(|err| RefineError::MalformedReply(err.to_string()))?;

    let match_score = extract_score(raw.get("match_score")).ok_or(RefineError::MissingScore)?;

    Ok(RefinedEvaluation {
        match_score,
        strengths: string_list(raw.get("strengths")),
        gaps: string_list(raw.get("gaps")),
        justification: raw
            .get("justification")
            .and_then(Value::as_str)
            .map(str::to_string),
        raw: Some(raw),
    })
}

fn extract_score(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn string_list(value: Option<&Value>) -> Option<Vec<String>> {
    let items = value?.as_array()?;
    Some(
        items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect(),
    )
}

/// Strips ```json ... ``` or ``` ... ``` code fences from model output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}
