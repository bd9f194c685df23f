//! Extraction collaborator: free text in, candidate email out.
//!
//! Extraction never fails from the caller's point of view. Provider errors
//! and empty replies collapse to [`NONE_SENTINEL`], which downstream
//! validation rejects like any other malformed string.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::providers::router::ModelRouter;
use crate::providers::{CompletionRequest, LlmProvider, Message, StopReason};

/// Value returned when no email could be extracted.
pub const NONE_SENTINEL: &str = "none";

/// Instruction sent ahead of the user's text.
pub const EXTRACTION_INSTRUCTION: &str =
    "Extract ONLY the email address. Return just the email. If none, return 'none'.";

/// Upper bound on generated tokens; an address is short.
const EXTRACTION_MAX_TOKENS: u32 = 50;

/// Turns raw user text into a single candidate email string.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Extract a candidate. Returns [`NONE_SENTINEL`] instead of failing.
    async fn extract(&self, text: &str) -> String;
}

/// Extractor backed by one or more LLM providers, tried in order.
pub struct LlmExtractor {
    providers: Vec<Arc<dyn LlmProvider>>,
}

impl LlmExtractor {
    /// Build an extractor from an explicit provider chain.
    pub fn new(providers: Vec<Arc<dyn LlmProvider>>) -> Self {
        Self { providers }
    }

    /// Build an extractor from a router's primary + fallback chain.
    pub fn from_router(router: &ModelRouter) -> Self {
        Self::new(router.chain())
    }
}

/// Build the completion request for one extraction.
pub fn extraction_request(text: &str) -> CompletionRequest {
    CompletionRequest {
        messages: vec![Message::user(format!("Text: {text}"))],
        system: Some(EXTRACTION_INSTRUCTION.to_owned()),
        max_tokens: Some(EXTRACTION_MAX_TOKENS),
        stop_sequences: vec![],
    }
}

#[async_trait]
impl Extractor for LlmExtractor {
    async fn extract(&self, text: &str) -> String {
        for provider in &self.providers {
            match provider.complete(extraction_request(text)).await {
                Ok(response) => {
                    let extracted = response.text.trim();
                    if extracted.is_empty() {
                        warn!(model = provider.model_id(), "empty extraction reply");
                        return NONE_SENTINEL.to_owned();
                    }
                    if response.stop_reason == StopReason::MaxTokens {
                        warn!(model = provider.model_id(), "extraction reply hit the token cap");
                    }
                    debug!(
                        model = provider.model_id(),
                        input_tokens = response.usage.input_tokens,
                        output_tokens = response.usage.output_tokens,
                        "extraction completed"
                    );
                    return extracted.to_owned();
                }
                Err(e) => {
                    warn!(model = provider.model_id(), error = %e, "extraction provider failed");
                }
            }
        }
        NONE_SENTINEL.to_owned()
    }
}
