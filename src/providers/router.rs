//! Model router instantiating the extraction providers from config.
//!
//! Model specs use the `<provider>/<model>` form, e.g.
//! `gemini/gemini-2.5-flash` or `ollama/llama3`.

use std::sync::Arc;

use crate::config::{LlmConfig, ModelsConfig};
use crate::credentials::Credentials;

use super::gemini::GeminiProvider;
use super::ollama::OllamaProvider;
use super::LlmProvider;

/// Provider routing errors.
#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    /// Model spec is not in `<provider>/<model>` format.
    #[error("invalid model spec '{spec}', expected '<provider>/<model>'")]
    InvalidModelSpec {
        /// Invalid raw spec.
        spec: String,
    },
    /// Unsupported provider type in spec prefix.
    #[error("unsupported provider '{provider}'")]
    UnsupportedProvider {
        /// Unsupported provider prefix.
        provider: String,
    },
    /// Required API credential missing for selected provider.
    #[error("missing credential for provider '{provider}': {key}")]
    MissingCredential {
        /// Provider name.
        provider: String,
        /// Missing credential key.
        key: String,
    },
}

/// Primary extraction provider plus an optional fallback.
#[derive(Clone)]
pub struct ModelRouter {
    primary: Arc<dyn LlmProvider>,
    fallback: Option<Arc<dyn LlmProvider>>,
}

impl ModelRouter {
    /// Build a router from model config and loaded credentials.
    ///
    /// A fallback that cannot be instantiated is dropped with a warning;
    /// the primary is mandatory.
    ///
    /// # Errors
    ///
    /// Returns an error if the primary provider cannot be instantiated.
    pub fn from_config(
        models: &ModelsConfig,
        llm: &LlmConfig,
        credentials: &Credentials,
    ) -> Result<Self, RouterError> {
        let primary = build_provider(&models.extractor, llm, credentials)?;

        let fallback = match models.fallback.as_deref() {
            Some(spec) => match build_provider(spec, llm, credentials) {
                Ok(provider) => Some(provider),
                Err(e) => {
                    tracing::warn!(spec, error = %e, "fallback provider unavailable, ignoring");
                    None
                }
            },
            None => None,
        };

        Ok(Self { primary, fallback })
    }

    /// Create a router from already-built providers.
    pub fn new(primary: Arc<dyn LlmProvider>, fallback: Option<Arc<dyn LlmProvider>>) -> Self {
        Self { primary, fallback }
    }

    /// Providers in the order they should be tried.
    pub fn chain(&self) -> Vec<Arc<dyn LlmProvider>> {
        let mut chain = vec![Arc::clone(&self.primary)];
        if let Some(fallback) = &self.fallback {
            chain.push(Arc::clone(fallback));
        }
        chain
    }

    /// Model spec of the primary provider.
    pub fn primary_spec(&self) -> &str {
        self.primary.model_id()
    }
}

/// Parsed `<provider>/<model>` spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedModelSpec {
    /// Provider prefix.
    pub provider: String,
    /// Model name; may itself contain `/` or `:`.
    pub model: String,
}

/// Split a model spec at its first `/`.
///
/// # Errors
///
/// Returns [`RouterError::InvalidModelSpec`] when either side is empty.
pub fn parse_model_spec(spec: &str) -> Result<ParsedModelSpec, RouterError> {
    let mut split = spec.splitn(2, '/');
    let provider = split.next().unwrap_or_default();
    let model = split.next().unwrap_or_default();
    if provider.is_empty() || model.is_empty() {
        return Err(RouterError::InvalidModelSpec {
            spec: spec.to_owned(),
        });
    }
    Ok(ParsedModelSpec {
        provider: provider.to_owned(),
        model: model.to_owned(),
    })
}

/// Instantiate the provider named by `spec`.
///
/// # Errors
///
/// Returns a [`RouterError`] for malformed specs, unknown providers, or a
/// missing Gemini API key.
pub fn build_provider(
    spec: &str,
    llm: &LlmConfig,
    credentials: &Credentials,
) -> Result<Arc<dyn LlmProvider>, RouterError> {
    let parsed = parse_model_spec(spec)?;
    match parsed.provider.as_str() {
        "gemini" => {
            let key_name = &llm.gemini.api_key_env;
            let api_key =
                credentials
                    .resolve(key_name)
                    .ok_or_else(|| RouterError::MissingCredential {
                        provider: parsed.provider.clone(),
                        key: key_name.clone(),
                    })?;
            Ok(Arc::new(
                GeminiProvider::new(spec.to_owned(), parsed.model, api_key)
                    .with_base_url(&llm.gemini.base_url),
            ))
        }
        "ollama" => Ok(Arc::new(
            OllamaProvider::new(spec.to_owned(), parsed.model)
                .with_base_url(&llm.ollama.base_url),
        )),
        _ => Err(RouterError::UnsupportedProvider {
            provider: parsed.provider,
        }),
    }
}
