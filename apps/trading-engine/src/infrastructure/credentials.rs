//! Credential providers.

use std::sync::Arc;

use async_trait::async_trait;

use super::exchange::BitvavoConnector;
use crate::application::ports::{CredentialError, CredentialProvider, CredentialSet, ExchangePort, GatewayError};

fn complete(credentials: Option<CredentialSet>) -> Option<Arc<CredentialSet>> {
    credentials.filter(CredentialSet::is_complete).map(Arc::new)
}

/// Credentials that are accepted as soon as they are present.
///
/// For offline runs and tests; never contacts an exchange.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentialProvider {
    credentials: Option<Arc<CredentialSet>>,
}

impl StaticCredentialProvider {
    /// Wrap a possibly-missing credential set.
    #[must_use]
    pub fn new(credentials: Option<CredentialSet>) -> Self {
        Self {
            credentials: complete(credentials),
        }
    }
}

#[async_trait]
impl CredentialProvider for StaticCredentialProvider {
    fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }

    async fn validate(&self) -> Result<Arc<CredentialSet>, CredentialError> {
        self.credentials.clone().ok_or(CredentialError::Missing)
    }
}

/// Validates credentials against the exchange on every call.
#[derive(Debug, Clone)]
pub struct ExchangeCredentialProvider {
    credentials: Option<Arc<CredentialSet>>,
    connector: BitvavoConnector,
}

impl ExchangeCredentialProvider {
    /// Create a provider checking `credentials` through `connector`.
    #[must_use]
    pub fn new(credentials: Option<CredentialSet>, connector: BitvavoConnector) -> Self {
        Self {
            credentials: complete(credentials),
            connector,
        }
    }
}

#[async_trait]
impl CredentialProvider for ExchangeCredentialProvider {
    fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }

    async fn validate(&self) -> Result<Arc<CredentialSet>, CredentialError> {
        let credentials = self.credentials.clone().ok_or(CredentialError::Missing)?;
        let exchange = self
            .connector
            .exchange(Arc::clone(&credentials))
            .map_err(unverified)?;

        exchange.server_time().await.map_err(unverified)?;
        // Time is public; the balance call is what proves the key works.
        exchange.balance().await.map_err(unverified)?;

        tracing::info!(api_key = %redact(credentials.api_key()), "API credentials validated");
        Ok(credentials)
    }
}

fn unverified(err: GatewayError) -> CredentialError {
    match err {
        GatewayError::Authentication { message } => CredentialError::Rejected { reason: message },
        other => CredentialError::Unreachable {
            reason: other.to_string(),
        },
    }
}

fn redact(api_key: &str) -> String {
    let visible: String = api_key.chars().take(4).collect();
    format!("{visible}***")
}
