//! Real exchange (Bitvavo) connection settings and credentials.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::application::ports::CredentialSet;

/// Exchange configuration.
///
/// `api_key` and `api_secret` normally come from `${BITVAVO_API_KEY}` and
/// `${BITVAVO_API_SECRET}`; empty values mean "not configured".
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeConfig {
    /// REST base URL including the `/v2` prefix.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Signature validity window in milliseconds.
    #[serde(default = "default_access_window_ms")]
    pub access_window_ms: u64,
    /// API key.
    #[serde(default)]
    pub api_key: String,
    /// API secret.
    #[serde(default)]
    pub api_secret: String,
    /// Check credentials with an authenticated call before entering live.
    /// When false, presence of both values is enough.
    #[serde(default = "default_verify_credentials")]
    pub verify_credentials: bool,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            access_window_ms: default_access_window_ms(),
            api_key: String::new(),
            api_secret: String::new(),
            verify_credentials: default_verify_credentials(),
        }
    }
}

impl fmt::Debug for ExchangeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExchangeConfig")
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("access_window_ms", &self.access_window_ms)
            .field("credentials", &self.credentials())
            .field("verify_credentials", &self.verify_credentials)
            .finish()
    }
}

impl ExchangeConfig {
    /// The configured credential set, if both halves are present.
    #[must_use]
    pub fn credentials(&self) -> Option<CredentialSet> {
        let key = self.api_key.trim();
        let secret = self.api_secret.trim();
        (!key.is_empty() && !secret.is_empty()).then(|| CredentialSet::new(key, secret))
    }
}

fn default_base_url() -> String {
    "https://api.bitvavo.com/v2".to_string()
}

const fn default_timeout_secs() -> u64 {
    30
}

const fn default_access_window_ms() -> u64 {
    10_000
}

const fn default_verify_credentials() -> bool {
    true
}
