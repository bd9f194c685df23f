//! Model backends used for email extraction.
//!
//! Each backend turns an extraction [`CompletionRequest`] into one HTTP call
//! and reports the reply text. The extractor never sees wire formats, only
//! the [`LlmProvider`] trait.
//!
//! - [`gemini::GeminiProvider`] talks to the hosted `generateContent` API.
//! - [`ollama::OllamaProvider`] talks to a local `/api/chat` server.
//!
//! [`router::ModelRouter`] picks backends from `<provider>/<model>` specs.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub mod gemini;
pub mod ollama;
pub mod router;

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Text supplied by the workflow.
    User,
    /// Earlier model output.
    Assistant,
}

/// One turn of the extraction prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Author.
    pub role: Role,
    /// Plain text.
    pub content: String,
}

impl Message {
    /// A workflow-authored turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Backend-neutral extraction prompt.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Prompt turns, oldest first.
    pub messages: Vec<Message>,
    /// Instruction placed ahead of the turns.
    pub system: Option<String>,
    /// Generation cap; backends apply their own default when unset.
    pub max_tokens: Option<u32>,
    /// Strings that end generation early.
    pub stop_sequences: Vec<String>,
}

/// Why a backend stopped generating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// The model finished on its own.
    EndTurn,
    /// The generation cap cut the reply short.
    MaxTokens,
    /// Any other backend-reported reason, verbatim.
    Other(String),
}

impl StopReason {
    /// Map a backend's raw finish reason given its names for a natural
    /// stop and for hitting the cap. A missing reason counts as natural.
    pub fn classify(raw: Option<&str>, end_turn: &str, max_tokens: &str) -> Self {
        match raw {
            None => Self::EndTurn,
            Some(r) if r == end_turn => Self::EndTurn,
            Some(r) if r == max_tokens => Self::MaxTokens,
            Some(other) => Self::Other(other.to_owned()),
        }
    }
}

/// Token counts reported by a backend (zero when it reports none).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UsageStats {
    /// Prompt tokens.
    pub input_tokens: u32,
    /// Reply tokens.
    pub output_tokens: u32,
}

/// A backend's reply, not yet trimmed or validated.
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// Raw reply text.
    pub text: String,
    /// Why generation ended.
    pub stop_reason: StopReason,
    /// Token counts.
    pub usage: UsageStats,
    /// Model name as reported by the backend.
    pub model: String,
}

/// Failure to get a reply from an extraction backend.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The request never got an HTTP answer.
    #[error("could not reach extraction model: {0}")]
    Request(#[from] reqwest::Error),
    /// The answer was not the JSON shape the backend documents.
    #[error("unexpected reply from extraction model: {0}")]
    Parse(String),
    /// The backend answered with a non-2xx status.
    #[error("extraction model answered HTTP {status}: {body}")]
    HttpStatus {
        /// Status code.
        status: u16,
        /// Response body with secrets redacted, shortened.
        body: String,
    },
    /// The backend cannot be used as configured.
    #[error("extraction model unavailable: {0}")]
    Unavailable(String),
}

/// Longest error body kept in a [`ProviderError::HttpStatus`].
const ERROR_BODY_LIMIT: usize = 256;

/// Credential shapes that upstream errors sometimes echo back.
static SECRET_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"AIza[0-9A-Za-z_\-]{30,}",
        r"ya29\.[0-9A-Za-z_\-]{20,}",
        r"sk-[A-Za-z0-9]{32,}",
        r"ghp_[A-Za-z0-9]{20,}",
    ]
    .into_iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

/// Return the body of a 2xx response, or turn any other status into
/// [`ProviderError::HttpStatus`] with a log-safe body.
///
/// # Errors
///
/// [`ProviderError::Request`] if the body cannot be read,
/// [`ProviderError::HttpStatus`] for a non-2xx status.
pub async fn check_http_response(response: reqwest::Response) -> Result<String, ProviderError> {
    let status = response.status();
    let body = response.text().await?;
    if status.is_success() {
        return Ok(body);
    }
    let single_line = body.split_whitespace().collect::<Vec<_>>().join(" ");
    Err(ProviderError::HttpStatus {
        status: status.as_u16(),
        body: truncate_for_error(&redact_secrets(&single_line)),
    })
}

fn redact_secrets(text: &str) -> String {
    SECRET_PATTERNS
        .iter()
        .fold(text.to_owned(), |acc, re| {
            re.replace_all(&acc, "[REDACTED]").into_owned()
        })
}

fn truncate_for_error(text: &str) -> String {
    match text.char_indices().nth(ERROR_BODY_LIMIT) {
        Some((cut, _)) => format!("{}...[truncated]", &text[..cut]),
        None => text.to_owned(),
    }
}

/// A model backend that can answer an extraction prompt.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send one prompt and wait for the whole reply.
    ///
    /// # Errors
    ///
    /// Any [`ProviderError`]; the extractor logs it and tries the next backend.
    async fn complete(&self, request: CompletionRequest)
        -> Result<CompletionResponse, ProviderError>;

    /// The `<provider>/<model>` spec this backend was built from.
    fn model_id(&self) -> &str;
}
