//! Configuration loading and management.
//!
//! Loads mailgate configuration from `./config.toml` (or `$MAILGATE_CONFIG_PATH`,
//! or an explicit `--config` path). Environment variables override file values;
//! file values override defaults.
//!
//! Precedence: env vars > config file > defaults.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::providers::gemini::DEFAULT_GEMINI_URL;
use crate::providers::ollama::DEFAULT_OLLAMA_URL;
use crate::workflow::transition::ReviewPolicy;

// ── Top-level config ────────────────────────────────────────────

/// Top-level mailgate configuration loaded from TOML.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MailgateConfig {
    /// Filesystem paths for persistent state.
    pub paths: PathsConfig,
    /// Log output settings.
    pub logging: LoggingConfig,
    /// Which models back the extraction step.
    pub models: ModelsConfig,
    /// Provider endpoints and credentials.
    pub llm: LlmConfig,
    /// Human review policy constants.
    pub policy: ReviewPolicy,
}

impl MailgateConfig {
    /// Load configuration with precedence: env vars > TOML file > defaults.
    ///
    /// `explicit` (from the `--config` flag) wins over `$MAILGATE_CONFIG_PATH`.
    /// If the resolved file does not exist, defaults are used.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(p) => p.to_path_buf(),
            None => Self::config_path_with(|key| std::env::var(key).ok()),
        };
        let mut config = Self::load_from_file(&path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load from a TOML file only, no env overrides.
    fn load_from_file(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(contents) => {
                tracing::debug!(path = %path.display(), "loading config from file");
                Self::from_toml(&contents)
                    .with_context(|| format!("invalid config file {}", path.display()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file found, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(anyhow::anyhow!(
                "failed to read config file {}: {e}",
                path.display()
            )),
        }
    }

    /// Resolve config path using a custom env resolver.
    fn config_path_with(env: impl Fn(&str) -> Option<String>) -> PathBuf {
        env("MAILGATE_CONFIG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// Apply environment variable overrides (env > config > defaults).
    ///
    /// Takes a resolver function so tests never mutate the process environment.
    pub fn apply_overrides(&mut self, env: impl Fn(&str) -> Option<String>) {
        // Paths.
        if let Some(v) = env("MAILGATE_STATE_PATH") {
            self.paths.state_file = PathBuf::from(v);
        }
        if let Some(v) = env("MAILGATE_ENV_FILE") {
            self.paths.env_file = PathBuf::from(v);
        }
        if let Some(v) = env("MAILGATE_LOGS_DIR") {
            self.paths.logs_dir = Some(PathBuf::from(v));
        }

        // Logging.
        if let Some(v) = env("MAILGATE_LOG_LEVEL") {
            self.logging.level = v;
        }

        // Models.
        if let Some(v) = env("MAILGATE_MODEL") {
            self.models.extractor = v;
        }
        if let Some(v) = env("MAILGATE_FALLBACK_MODEL") {
            self.models.fallback = if v.trim().is_empty() { None } else { Some(v) };
        }

        // Endpoints.
        if let Some(v) = env("MAILGATE_GEMINI_URL") {
            self.llm.gemini.base_url = v;
        }
        if let Some(v) = env("MAILGATE_OLLAMA_URL") {
            self.llm.ollama.base_url = v;
        }

        // Policy.
        if let Some(v) = env("MAILGATE_MAX_REJECTIONS") {
            match v.parse() {
                Ok(n) => self.policy.max_rejections = n,
                Err(_) => tracing::warn!(
                    var = "MAILGATE_MAX_REJECTIONS",
                    value = %v,
                    "ignoring invalid env override"
                ),
            }
        }
        if let Some(v) = env("MAILGATE_ACCEPT_CORRECTIONS") {
            match v.parse() {
                Ok(b) => self.policy.accept_corrections = b,
                Err(_) => tracing::warn!(
                    var = "MAILGATE_ACCEPT_CORRECTIONS",
                    value = %v,
                    "ignoring invalid env override"
                ),
            }
        }
    }

    /// Parse a TOML string into config.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not valid TOML for this schema.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: MailgateConfig =
            toml::from_str(toml_str).context("failed to parse config TOML")?;
        Ok(config)
    }
}

// ── Paths config ────────────────────────────────────────────────

/// Filesystem paths for persistent state.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// JSON snapshot of the workflow state, rewritten after every stage.
    pub state_file: PathBuf,
    /// `.env` file holding API keys.
    pub env_file: PathBuf,
    /// Directory for rotated JSON logs. Console-only logging when unset.
    pub logs_dir: Option<PathBuf>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            state_file: PathBuf::from("storage/session_state.json"),
            env_file: PathBuf::from(".env"),
            logs_dir: None,
        }
    }
}

// ── Logging config ──────────────────────────────────────────────

/// Log output settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Fallback `EnvFilter` directive when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
        }
    }
}

// ── Models config ───────────────────────────────────────────────

/// Model selection for the extraction step.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    /// Primary extractor spec, e.g. `"gemini/gemini-2.5-flash"`.
    pub extractor: String,
    /// Optional spec tried when the primary fails, e.g. `"ollama/llama3"`.
    pub fallback: Option<String>,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            extractor: "gemini/gemini-2.5-flash".to_owned(),
            fallback: None,
        }
    }
}

// ── LLM config ──────────────────────────────────────────────────

/// Provider endpoint configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Hosted Gemini API.
    pub gemini: GeminiConfig,
    /// Local Ollama server.
    pub ollama: OllamaConfig,
}

/// Gemini endpoint settings. The key itself lives in the `.env` file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    /// API base URL.
    pub base_url: String,
    /// Name of the credential holding the API key.
    pub api_key_env: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_GEMINI_URL.to_owned(),
            api_key_env: "GOOGLE_API_KEY".to_owned(),
        }
    }
}

/// Ollama endpoint settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    /// Ollama base URL.
    pub base_url: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OLLAMA_URL.to_owned(),
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────
