//! Gemini provider implementation using the `generateContent` API.
//!
//! This is the hosted-model backend. Authentication is an API key sent in
//! the `x-goog-api-key` header, never in the URL, so it cannot leak into
//! request logs.

use serde::{Deserialize, Serialize};

use super::{
    check_http_response, CompletionRequest, CompletionResponse, LlmProvider, ProviderError, Role,
    StopReason, UsageStats,
};

/// Default Generative Language API base URL.
pub const DEFAULT_GEMINI_URL: &str = "https://generativelanguage.googleapis.com";

const DEFAULT_MAX_TOKENS: u32 = 256;

// ---------------------------------------------------------------------------
// Wire types (pub for integration testing)
// ---------------------------------------------------------------------------

/// `generateContent` request body.
#[doc(hidden)]
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiRequest {
    /// Conversation turns.
    pub contents: Vec<GeminiContent>,
    /// Optional system instruction.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<GeminiContent>,
    /// Generation options.
    pub generation_config: GeminiGenerationConfig,
}

/// A content block (one turn) in Gemini format.
#[doc(hidden)]
#[derive(Debug, Serialize, Deserialize)]
pub struct GeminiContent {
    /// Role: "user" or "model". Absent for system instructions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Content parts.
    #[serde(default)]
    pub parts: Vec<GeminiPart>,
}

/// A single text part.
#[doc(hidden)]
#[derive(Debug, Serialize, Deserialize)]
pub struct GeminiPart {
    /// Part text. Non-text parts deserialize with no text.
    #[serde(default)]
    pub text: Option<String>,
}

/// Generation options.
#[doc(hidden)]
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiGenerationConfig {
    /// Maximum output tokens.
    pub max_output_tokens: u32,
    /// Stop sequences.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub stop_sequences: Vec<String>,
    /// Sampling temperature; extraction wants deterministic output.
    pub temperature: f32,
}

/// `generateContent` response body.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiResponse {
    /// Generated candidates; only the first is used.
    #[serde(default)]
    pub candidates: Vec<GeminiCandidate>,
    /// Token usage.
    pub usage_metadata: Option<GeminiUsage>,
    /// Model version that served the response.
    pub model_version: Option<String>,
}

/// A generated candidate.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiCandidate {
    /// Candidate content.
    pub content: Option<GeminiContent>,
    /// Finish reason ("STOP", "MAX_TOKENS", "SAFETY", ...).
    pub finish_reason: Option<String>,
}

/// Gemini usage metadata.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiUsage {
    /// Prompt tokens.
    #[serde(default)]
    pub prompt_token_count: u32,
    /// Generated tokens.
    #[serde(default)]
    pub candidates_token_count: u32,
}

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

/// Gemini `generateContent` provider.
#[derive(Clone)]
pub struct GeminiProvider {
    model_spec: String,
    /// Model name, e.g. `gemini-2.5-flash`.
    #[doc(hidden)]
    pub model: String,
    /// Base URL for the API.
    #[doc(hidden)]
    pub base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("model_spec", &self.model_spec)
            .field("base_url", &self.base_url)
            .field("api_key", &"__REDACTED__")
            .finish()
    }
}

impl GeminiProvider {
    /// Create a new Gemini provider instance.
    pub fn new(model_spec: String, model_name: String, api_key: String) -> Self {
        Self {
            model_spec,
            model: model_name,
            base_url: DEFAULT_GEMINI_URL.to_owned(),
            api_key,
            client: reqwest::Client::new(),
        }
    }

    /// Point the provider at a different API endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }
}

// ---------------------------------------------------------------------------
// Request / Response builders (pub for integration testing)
// ---------------------------------------------------------------------------

/// Build a Gemini API request from a completion request.
#[doc(hidden)]
pub fn build_request(request: &CompletionRequest) -> GeminiRequest {
    let contents = request
        .messages
        .iter()
        .map(|msg| {
            let role = match msg.role {
                Role::User => "user",
                Role::Assistant => "model",
            };
            GeminiContent {
                role: Some(role.to_owned()),
                parts: vec![GeminiPart {
                    text: Some(msg.content.clone()),
                }],
            }
        })
        .collect();

    let system_instruction = request.system.as_ref().map(|system| GeminiContent {
        role: None,
        parts: vec![GeminiPart {
            text: Some(system.clone()),
        }],
    });

    GeminiRequest {
        contents,
        system_instruction,
        generation_config: GeminiGenerationConfig {
            max_output_tokens: request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            stop_sequences: request.stop_sequences.clone(),
            temperature: 0.0,
        },
    }
}

/// Parse a Gemini API response into a completion response.
///
/// # Errors
///
/// Returns `ProviderError::Parse` if the body cannot be deserialized or
/// carries no candidate.
#[doc(hidden)]
pub fn parse_response(body: &str, requested_model: &str) -> Result<CompletionResponse, ProviderError> {
    let resp: GeminiResponse =
        serde_json::from_str(body).map_err(|e| ProviderError::Parse(e.to_string()))?;

    let candidate = resp
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::Parse("response contained no candidates".to_owned()))?;

    let text: String = candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect()
        })
        .unwrap_or_default();

    let stop_reason =
        StopReason::classify(candidate.finish_reason.as_deref(), "STOP", "MAX_TOKENS");

    let usage = resp
        .usage_metadata
        .map(|u| UsageStats {
            input_tokens: u.prompt_token_count,
            output_tokens: u.candidates_token_count,
        })
        .unwrap_or_default();

    Ok(CompletionResponse {
        text,
        stop_reason,
        usage,
        model: resp
            .model_version
            .unwrap_or_else(|| requested_model.to_owned()),
    })
}

// ---------------------------------------------------------------------------
// Trait impl
// ---------------------------------------------------------------------------

#[async_trait::async_trait]
impl LlmProvider for GeminiProvider {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, ProviderError> {
        let api_request = build_request(&request);

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        let response = self
            .client
            .post(&url)
            .header("content-type", "application/json")
            .header("x-goog-api-key", &self.api_key)
            .json(&api_request)
            .send()
            .await?;

        let payload = check_http_response(response).await?;
        parse_response(&payload, &self.model)
    }

    fn model_id(&self) -> &str {
        &self.model_spec
    }
}
