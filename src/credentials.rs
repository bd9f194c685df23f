//! Credential loading from a `.env` file with process-env fallback.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use tracing::debug;

/// API credentials loaded from the `.env` file.
#[derive(Clone, Default)]
pub struct Credentials {
    vars: BTreeMap<String, String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("keys", &self.vars.keys().collect::<Vec<_>>())
            .field("values", &"[REDACTED]")
            .finish()
    }
}

impl Credentials {
    /// Build credentials from a key-value map.
    pub fn from_map(vars: BTreeMap<String, String>) -> Self {
        Self { vars }
    }

    /// Returns a credential value from the loaded file, if present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Resolve a credential: file first, then the process environment.
    ///
    /// Surrounding whitespace and quotes are stripped; empty values count as absent.
    pub fn resolve(&self, key: &str) -> Option<String> {
        self.resolve_with(key, |k| std::env::var(k).ok())
    }

    /// Resolve a credential using a custom env resolver.
    pub fn resolve_with(&self, key: &str, env: impl Fn(&str) -> Option<String>) -> Option<String> {
        self.get(key)
            .map(str::to_owned)
            .or_else(|| env(key))
            .map(|raw| clean_secret(&raw))
            .filter(|value| !value.is_empty())
    }
}

fn clean_secret(raw: &str) -> String {
    raw.trim().trim_matches('"').trim_matches('\'').to_owned()
}

/// Load credentials from a `.env` path.
///
/// A missing file yields empty credentials; keys may still come from the
/// process environment through [`Credentials::resolve`].
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_credentials(path: &Path) -> anyhow::Result<Credentials> {
    if !path.exists() {
        debug!(path = %path.display(), "no credentials file, relying on process env");
        return Ok(Credentials::default());
    }

    let mut vars = BTreeMap::new();
    let iter = dotenvy::from_path_iter(path)
        .with_context(|| format!("failed to read credentials at {}", path.display()))?;

    for item in iter {
        let (key, value) = item.with_context(|| {
            format!(
                "failed to parse key-value entry in credentials file {}",
                path.display()
            )
        })?;
        vars.insert(key, value);
    }

    debug!(path = %path.display(), keys = vars.len(), "credentials loaded");
    Ok(Credentials { vars })
}
