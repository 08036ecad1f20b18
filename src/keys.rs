//! Credential store: the set of bearer tokens accepted by the proxy.
//!
//! Tokens are loaded once at startup, either from a JSON config file
//! (`{"apiKeys": ["...", ...]}`) or, when the file is missing or unusable,
//! from the comma-separated `API_KEYS` environment variable. The loaded set
//! is immutable for the lifetime of the process.

use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

/// Environment variable consulted when the config file yields no tokens.
pub const API_KEYS_ENV: &str = "API_KEYS";

#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("no API keys found: provide a config file with an \"apiKeys\" list or set {API_KEYS_ENV}")]
    NoKeys,
}

#[derive(Debug, Deserialize)]
struct KeyFile {
    #[serde(rename = "apiKeys", default)]
    api_keys: Vec<String>,
}

/// Immutable set of valid bearer tokens.
///
/// Built once before the listener starts accepting and shared read-only
/// across request tasks, so membership tests need no synchronization.
#[derive(Debug, Clone)]
pub struct ApiKeys {
    tokens: HashSet<String>,
}

impl ApiKeys {
    /// Build a credential set from explicit tokens. Empty input is a
    /// configuration error, same as for [`ApiKeys::load`].
    pub fn new<I, S>(tokens: I) -> Result<Self, KeyError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tokens: HashSet<String> = tokens
            .into_iter()
            .map(Into::into)
            .filter(|t| !t.is_empty())
            .collect();
        if tokens.is_empty() {
            return Err(KeyError::NoKeys);
        }
        Ok(Self { tokens })
    }

    /// Load tokens, preferring the config file and falling back to the
    /// `API_KEYS` environment variable.
    ///
    /// A missing, unreadable, or malformed file (including an absent or
    /// empty `apiKeys` field) is not an error by itself; it only becomes
    /// fatal when the env fallback yields nothing either.
    pub fn load(config_path: &Path) -> Result<Self, KeyError> {
        if let Some(tokens) = Self::from_config_file(config_path) {
            debug!(
                path = %config_path.display(),
                count = tokens.len(),
                "loaded API keys from config file"
            );
            return Self::new(tokens);
        }

        if let Ok(raw) = std::env::var(API_KEYS_ENV) {
            let tokens: Vec<String> = raw
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect();
            if !tokens.is_empty() {
                debug!(count = tokens.len(), "loaded API keys from {API_KEYS_ENV}");
                return Self::new(tokens);
            }
        }

        Err(KeyError::NoKeys)
    }

    fn from_config_file(path: &Path) -> Option<Vec<String>> {
        let raw = std::fs::read_to_string(path).ok()?;
        let parsed: KeyFile = serde_json::from_str(&raw).ok()?;
        if parsed.api_keys.is_empty() {
            return None;
        }
        Some(parsed.api_keys)
    }

    /// Membership test; the only runtime operation on the set.
    pub fn contains(&self, token: &str) -> bool {
        self.tokens.contains(token)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}
