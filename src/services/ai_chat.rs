//! Pass-through chat proxy to the Gemini generative-language API.
//!
//! Each message walks an ordered list of candidate models and API versions.
//! Only "model unavailable" failures (HTTP 404, or a message saying the model
//! does not support `generateContent`) advance to the next candidate; any
//! other failure is returned immediately.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, warn};

use super::{ServiceError, ServiceResult};
use crate::config::AiConfig;

const FALLBACK_MODELS: [&str; 5] = [
    "gemini-1.5-flash-002",
    "gemini-1.5-flash-001",
    "gemini-1.5-pro-002",
    "gemini-1.5-pro-001",
    "gemini-1.0-pro",
];
const API_VERSIONS: [&str; 2] = ["v1beta", "v1"];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
}

#[derive(Debug, Error)]
pub enum AiChatError {
    #[error("AI provider key is not configured")]
    MissingKey,

    #[error("gemini blocked the prompt ({0})")]
    Blocked(String),

    #[error("gemini refused to answer due to safety settings")]
    Safety,

    #[error("gemini returned an empty response")]
    Empty,

    #[error("{}", api_error_message(.version, .code, .status, .message))]
    Api {
        version: String,
        code: u16,
        status: String,
        message: String,
    },

    #[error("gemini transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

fn api_error_message(version: &str, code: impl std::fmt::Display, status: &str, message: &str) -> String {
    if message.is_empty() {
        format!("gemini API error ({} {} {})", version, code, status)
    } else {
        format!("gemini API error ({} {} {}): {}", version, code, status, message)
    }
}

impl AiChatError {
    /// Model or version unavailable; worth trying the next candidate.
    fn is_fallback(&self) -> bool {
        match self {
            AiChatError::Api { code, message, .. } => {
                *code == StatusCode::NOT_FOUND.as_u16()
                    || message
                        .to_lowercase()
                        .contains("not supported for generatecontent")
            }
            _ => false,
        }
    }
}

impl From<AiChatError> for ServiceError {
    fn from(err: AiChatError) -> Self {
        ServiceError::Upstream(err.to_string())
    }
}

// Wire shapes

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct GenerateResponse {
    candidates: Vec<Candidate>,
    prompt_feedback: PromptFeedback,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct Candidate {
    finish_reason: String,
    content: CandidateContent,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CandidateContent {
    parts: Vec<Part>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Part {
    text: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ErrorBody {
    code: i64,
    message: String,
    status: String,
}

#[derive(Clone)]
pub struct AiChatService {
    client: Client,
    config: AiConfig,
}

impl AiChatService {
    pub fn new(config: AiConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(config.timeout().max(Duration::from_secs(1)))
            .build()?;
        Ok(Self { client, config })
    }

    pub async fn chat(&self, request: ChatRequest) -> ServiceResult<ChatResponse> {
        let message = request.message.trim();
        if message.is_empty() {
            return Err(ServiceError::validation("message is required"));
        }

        let key = request
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .unwrap_or_else(|| self.config.api_key.trim());
        if key.is_empty() {
            return Err(AiChatError::MissingKey.into());
        }

        let response = self.generate(key, message).await?;
        Ok(ChatResponse { response })
    }

    /// Preferred model first, then the fallbacks, without duplicates.
    pub fn candidate_models(&self) -> Vec<String> {
        let mut models: Vec<String> = Vec::with_capacity(FALLBACK_MODELS.len() + 1);
        let preferred = self.config.model.trim();
        for model in std::iter::once(preferred).chain(FALLBACK_MODELS) {
            if !model.is_empty() && !models.iter().any(|m| m == model) {
                models.push(model.to_string());
            }
        }
        models
    }

    async fn generate(&self, key: &str, message: &str) -> Result<String, AiChatError> {
        let mut last_err = None;
        for model in self.candidate_models() {
            for version in API_VERSIONS {
                match self.invoke(key, message, &model, version).await {
                    Ok(text) => return Ok(text),
                    Err(e) if e.is_fallback() => {
                        debug!("gemini model {} unavailable on {}: {}", model, version, e);
                        last_err = Some(e);
                    }
                    Err(e) => {
                        warn!("gemini call failed on {} {}: {}", model, version, e);
                        return Err(e);
                    }
                }
            }
        }
        Err(last_err.unwrap_or(AiChatError::Empty))
    }

    async fn invoke(
        &self,
        key: &str,
        message: &str,
        model: &str,
        version: &str,
    ) -> Result<String, AiChatError> {
        let endpoint = format!(
            "{}/{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            version,
            model
        );
        let payload = json!({
            "contents": [{ "role": "user", "parts": [{ "text": message }] }],
            "generationConfig": {
                "temperature": 0.7,
                "topP": 0.95,
                "candidateCount": 1,
                "maxOutputTokens": 1024
            }
        });

        let response = self
            .client
            .post(&endpoint)
            .query(&[("key", key)])
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;
        if status.is_client_error() || status.is_server_error() {
            return Err(parse_api_error(version, status, &body));
        }

        let parsed: GenerateResponse = serde_json::from_slice(&body).map_err(|e| {
            warn!("unparseable gemini response: {}", e);
            AiChatError::Empty
        })?;
        extract_text(parsed)
    }
}

fn parse_api_error(version: &str, status: StatusCode, body: &[u8]) -> AiChatError {
    let canonical = status.canonical_reason().unwrap_or_default().to_string();
    match serde_json::from_slice::<ErrorEnvelope>(body) {
        Ok(envelope) if envelope.error.code != 0 || !envelope.error.message.is_empty() => {
            AiChatError::Api {
                version: version.to_string(),
                code: status.as_u16(),
                status: if envelope.error.status.is_empty() {
                    canonical
                } else {
                    envelope.error.status
                },
                message: envelope.error.message,
            }
        }
        _ => AiChatError::Api {
            version: version.to_string(),
            code: status.as_u16(),
            status: canonical,
            message: format!("status {}", status.as_u16()),
        },
    }
}

/// First candidate with non-blank text wins; a blank candidate that finished
/// for safety reasons short-circuits.
fn extract_text(response: GenerateResponse) -> Result<String, AiChatError> {
    let block_reason = response.prompt_feedback.block_reason.trim();
    if !block_reason.is_empty() {
        return Err(AiChatError::Blocked(block_reason.to_lowercase()));
    }

    for candidate in response.candidates {
        let text: String = candidate
            .content
            .parts
            .iter()
            .map(|p| p.text.as_str())
            .collect();
        let text = text.trim();
        if !text.is_empty() {
            return Ok(text.to_string());
        }
        if candidate.finish_reason.eq_ignore_ascii_case("safety") {
            return Err(AiChatError::Safety);
        }
    }
    Err(AiChatError::Empty)
}
