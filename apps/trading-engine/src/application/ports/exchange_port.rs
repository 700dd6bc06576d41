//! Exchange Port (Driven Port)
//!
//! Capability-uniform interface implemented by both the simulated exchange
//! and the real exchange adapter.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;

use super::CredentialSet;
use crate::domain::order_execution::{BalanceSnapshot, ExchangeOrder, OrderBook, OrderRequest};
use crate::domain::shared::{ClientOrderId, ExchangeOrderId, Market};
use crate::error::{ErrorCode, ExecutionError};

/// Gateway failure, classified by what it tells us about delivery.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    /// The request never reached the exchange (connect or build failure).
    /// Repeating it is safe.
    #[error("exchange unavailable: {message}")]
    Unavailable {
        /// Error details.
        message: String,
    },

    /// No answer in time. The exchange may or may not have acted on it.
    #[error("exchange request timed out: {message}")]
    Timeout {
        /// Error details.
        message: String,
    },

    /// Throttled before processing.
    #[error("rate limited by exchange")]
    RateLimited {
        /// Suggested delay.
        retry_after: Option<Duration>,
    },

    /// Credentials refused.
    #[error("exchange authentication failed: {message}")]
    Authentication {
        /// Error details.
        message: String,
    },

    /// The exchange understood and refused the request.
    #[error("rejected by exchange: {reason}")]
    Rejected {
        /// Exchange reason.
        reason: String,
    },

    /// Unknown order or market.
    #[error("not found on exchange: {what}")]
    NotFound {
        /// What was looked up.
        what: String,
    },

    /// Response could not be understood.
    #[error("unexpected exchange response: {message}")]
    Protocol {
        /// Error details.
        message: String,
        /// Exchange order id, when the response still carried one.
        order_id: Option<ExchangeOrderId>,
    },
}

impl GatewayError {
    /// Whether an idempotent read may be repeated after this failure.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Unavailable { .. } | Self::Timeout { .. } | Self::RateLimited { .. }
        )
    }

    /// Whether a state-changing request may have been applied despite the failure.
    #[must_use]
    pub const fn may_have_executed(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Protocol { .. })
    }

    /// Exchange order id carried by the failure, if the exchange assigned one.
    #[must_use]
    pub const fn exchange_order_id(&self) -> Option<&ExchangeOrderId> {
        match self {
            Self::Protocol {
                order_id: Some(id), ..
            } => Some(id),
            _ => None,
        }
    }
}

impl From<GatewayError> for ExecutionError {
    fn from(err: GatewayError) -> Self {
        let message = err.to_string();
        match err {
            GatewayError::Rejected { .. } => Self::invalid_order(message),
            GatewayError::NotFound { what } => {
                Self::new(ErrorCode::OrderNotFound, message).with_context("order_id", what)
            }
            GatewayError::Unavailable { .. }
            | GatewayError::Timeout { .. }
            | GatewayError::RateLimited { .. }
            | GatewayError::Authentication { .. }
            | GatewayError::Protocol { .. } => Self::gateway_unavailable(message),
        }
    }
}

/// Port for exchange interactions.
#[async_trait]
pub trait ExchangePort: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Last traded price.
    async fn ticker_price(&self, market: &Market) -> Result<Decimal, GatewayError>;

    /// Order book, `depth` levels per side.
    async fn order_book(&self, market: &Market, depth: usize) -> Result<OrderBook, GatewayError>;

    /// Account balances.
    async fn balance(&self) -> Result<BalanceSnapshot, GatewayError>;

    /// Place an order tagged with an idempotency key.
    async fn place_order(
        &self,
        request: &OrderRequest,
        client_order_id: &ClientOrderId,
    ) -> Result<ExchangeOrder, GatewayError>;

    /// Fetch one order by exchange id.
    async fn get_order(
        &self,
        market: &Market,
        order_id: &ExchangeOrderId,
    ) -> Result<ExchangeOrder, GatewayError>;

    /// Look an order up by its idempotency key. `Ok(None)` means the
    /// exchange confirmed no such order exists.
    async fn find_order_by_client_id(
        &self,
        market: &Market,
        client_order_id: &ClientOrderId,
    ) -> Result<Option<ExchangeOrder>, GatewayError>;

    /// Cancel an open order.
    async fn cancel_order(
        &self,
        market: &Market,
        order_id: &ExchangeOrderId,
    ) -> Result<ExchangeOrder, GatewayError>;

    /// Open orders, optionally for one market.
    async fn open_orders(&self, market: Option<&Market>) -> Result<Vec<ExchangeOrder>, GatewayError>;

    /// Cheap reachability and authentication probe.
    async fn health_check(&self) -> Result<(), GatewayError>;
}

/// Builds a real exchange client for a validated credential set.
pub trait RealExchangeConnector: Send + Sync {
    /// Construct (but do not probe) a client bound to `credentials`.
    fn connect(&self, credentials: Arc<CredentialSet>) -> Result<Arc<dyn ExchangePort>, GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_ambiguous_failures_may_have_executed() {
        let timeout = GatewayError::Timeout {
            message: "read timed out".to_string(),
        };
        let refused = GatewayError::Unavailable {
            message: "connection refused".to_string(),
        };
        assert!(timeout.may_have_executed());
        assert!(!refused.may_have_executed());
        assert!(refused.is_retryable());
        assert!(
            !GatewayError::Rejected {
                reason: "bad".to_string()
            }
            .is_retryable()
        );
    }

    #[test]
    fn maps_to_execution_errors() {
        let err: ExecutionError = GatewayError::Authentication {
            message: "bad key".to_string(),
        }
        .into();
        assert_eq!(err.code(), ErrorCode::GatewayUnavailable);

        let err: ExecutionError = GatewayError::NotFound {
            what: "SIM-1".to_string(),
        }
        .into();
        assert_eq!(err.code(), ErrorCode::OrderNotFound);
    }
}
