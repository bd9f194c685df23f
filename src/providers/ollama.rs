//! Local extraction backend speaking Ollama's `/api/chat`.
//!
//! No credentials: the server is trusted by location. Replies are requested
//! unstreamed at temperature zero so the same text extracts the same address.

use serde::{Deserialize, Serialize};

use super::{
    check_http_response, CompletionRequest, CompletionResponse, LlmProvider, ProviderError, Role,
    StopReason, UsageStats,
};

/// Where `ollama serve` listens unless configured otherwise.
pub const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";

/// `/api/chat` request body.
#[doc(hidden)]
#[derive(Debug, Serialize)]
pub struct OllamaRequest<'a> {
    /// Pulled model name.
    pub model: &'a str,
    /// Instruction turn first, then the prompt turns.
    pub messages: Vec<OllamaMessage<'a>>,
    /// Always false.
    pub stream: bool,
    /// Sampling options.
    pub options: OllamaOptions<'a>,
}

/// One chat turn on the wire.
#[doc(hidden)]
#[derive(Debug, Serialize)]
pub struct OllamaMessage<'a> {
    /// `system`, `user` or `assistant`.
    pub role: &'static str,
    /// Turn text.
    pub content: &'a str,
}

/// Sampling options sent with every extraction.
#[doc(hidden)]
#[derive(Debug, Serialize)]
pub struct OllamaOptions<'a> {
    /// Generation cap.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_predict: Option<u32>,
    /// Stop strings, omitted when empty.
    #[serde(skip_serializing_if = "no_stops")]
    pub stop: &'a [String],
    /// Fixed at zero.
    pub temperature: f32,
}

fn no_stops(stop: &&[String]) -> bool {
    stop.is_empty()
}

/// The parts of an `/api/chat` reply the extractor reads.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct OllamaResponse {
    /// Model that answered.
    pub model: String,
    /// The assistant turn.
    pub message: OllamaReply,
    /// `stop`, `length`, or absent on older servers.
    #[serde(default)]
    pub done_reason: Option<String>,
    /// Prompt tokens.
    #[serde(default)]
    pub prompt_eval_count: u32,
    /// Reply tokens.
    #[serde(default)]
    pub eval_count: u32,
}

/// Assistant turn inside [`OllamaResponse`].
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct OllamaReply {
    /// Reply text, untrimmed.
    pub content: String,
}

/// Extraction through a local or LAN Ollama server.
#[derive(Debug, Clone)]
pub struct OllamaProvider {
    model_spec: String,
    /// Name of the pulled model, e.g. `llama3`.
    #[doc(hidden)]
    pub model: String,
    /// Server root without a trailing slash.
    #[doc(hidden)]
    pub base_url: String,
    client: reqwest::Client,
}

impl OllamaProvider {
    /// Backend for `model_name` on the default local server.
    pub fn new(model_spec: String, model_name: String) -> Self {
        Self {
            model_spec,
            model: model_name,
            base_url: DEFAULT_OLLAMA_URL.to_owned(),
            client: reqwest::Client::new(),
        }
    }

    /// Use another server, e.g. a GPU box on the LAN.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }
}

fn wire_role(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Assistant => "assistant",
    }
}

/// Lay out an extraction prompt as an `/api/chat` body. The instruction,
/// when present, travels as a leading `system` turn.
#[doc(hidden)]
pub fn build_request<'a>(model: &'a str, request: &'a CompletionRequest) -> OllamaRequest<'a> {
    let instruction = request.system.as_deref().map(|content| OllamaMessage {
        role: "system",
        content,
    });
    let turns = request.messages.iter().map(|msg| OllamaMessage {
        role: wire_role(msg.role),
        content: &msg.content,
    });

    OllamaRequest {
        model,
        messages: instruction.into_iter().chain(turns).collect(),
        stream: false,
        options: OllamaOptions {
            num_predict: request.max_tokens,
            stop: &request.stop_sequences,
            temperature: 0.0,
        },
    }
}

/// Read an `/api/chat` reply. Missing token counts read as zero.
///
/// # Errors
///
/// [`ProviderError::Parse`] when the body lacks `model` or `message`.
#[doc(hidden)]
pub fn parse_response(body: &str) -> Result<CompletionResponse, ProviderError> {
    let reply: OllamaResponse =
        serde_json::from_str(body).map_err(|e| ProviderError::Parse(format!("ollama: {e}")))?;

    Ok(CompletionResponse {
        text: reply.message.content,
        stop_reason: StopReason::classify(reply.done_reason.as_deref(), "stop", "length"),
        usage: UsageStats {
            input_tokens: reply.prompt_eval_count,
            output_tokens: reply.eval_count,
        },
        model: reply.model,
    })
}

#[async_trait::async_trait]
impl LlmProvider for OllamaProvider {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, ProviderError> {
        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&build_request(&self.model, &request))
            .send()
            .await?;

        parse_response(&check_http_response(response).await?)
    }

    fn model_id(&self) -> &str {
        &self.model_spec
    }
}
