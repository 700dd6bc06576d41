//! Bitvavo adapter configuration.

use std::time::Duration;

/// Production REST endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.bitvavo.com/v2";

/// Configuration for the Bitvavo REST client.
///
/// Credentials are not part of this struct; they arrive per connection
/// from the credential provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitvavoConfig {
    /// Base URL including the `/v2` prefix.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// `bitvavo-access-window` in milliseconds.
    pub access_window_ms: u64,
}

impl Default for BitvavoConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            access_window_ms: 10_000,
        }
    }
}

impl BitvavoConfig {
    /// Point the client at another endpoint.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Path prefix that takes part in the signature, e.g. `/v2`.
    #[must_use]
    pub fn signing_prefix(&self) -> &str {
        let without_scheme = self
            .base_url
            .split_once("://")
            .map_or(self.base_url.as_str(), |(_, rest)| rest);
        without_scheme
            .find('/')
            .map_or("", |idx| &without_scheme[idx..])
    }
}
