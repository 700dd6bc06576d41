//! Credential Port (Driven Port)
//!
//! The engine never reads credentials itself. Configuration hands it a
//! provider that knows whether a credential set exists and can check that
//! it is still accepted by the exchange.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

/// Exchange API credentials.
///
/// `Debug` redacts the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialSet {
    api_key: String,
    api_secret: String,
}

impl CredentialSet {
    /// Create a credential set.
    #[must_use]
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }

    /// API key.
    #[must_use]
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// API secret.
    #[must_use]
    pub fn api_secret(&self) -> &str {
        &self.api_secret
    }

    /// Both key and secret are non-blank.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.api_key.trim().is_empty() && !self.api_secret.trim().is_empty()
    }
}

impl fmt::Debug for CredentialSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shown = self.api_key.chars().take(4).collect::<String>();
        f.debug_struct("CredentialSet")
            .field("api_key", &format!("{shown}***"))
            .field("api_secret", &"***")
            .finish()
    }
}

/// Why a credential set cannot be used for live trading.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialError {
    /// No credentials configured.
    #[error("API credentials not configured")]
    Missing,

    /// The exchange refused the credentials.
    #[error("API credentials rejected: {reason}")]
    Rejected {
        /// Exchange reason.
        reason: String,
    },

    /// The exchange could not be reached to check them.
    #[error("could not verify API credentials: {reason}")]
    Unreachable {
        /// Error details.
        reason: String,
    },
}

/// Source of exchange credentials.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Whether a complete credential set is configured. Does no I/O.
    fn is_configured(&self) -> bool;

    /// Check, right now, that the credentials exist and are accepted.
    ///
    /// Never cached: every call re-validates.
    async fn validate(&self) -> Result<Arc<CredentialSet>, CredentialError>;
}
