//! Error taxonomy surfaced to callers of the trading engine.
//!
//! Every failure that reaches an API boundary is an [`ExecutionError`]: a
//! stable [`ErrorCode`], a human-readable message, and key/value context
//! (for example the exchange order id of an ambiguous placement).
//!
//! | Code | HTTP | Meaning |
//! |------|------|---------|
//! | `INVALID_ORDER` | 400 | Malformed order, caller can fix it |
//! | `INVALID_MODE` | 400 | Unknown trading mode |
//! | `INSUFFICIENT_FUNDS` | 422 | Not enough balance on the executing gateway |
//! | `RISK_LIMIT_EXCEEDED` | 422 | Per-mode risk limit would be breached |
//! | `CREDENTIAL_VALIDATION` | 409 | Live mode blocked, credentials missing or invalid |
//! | `MODE_SWITCH_INTERRUPTED` | 409 | Another transition committed first |
//! | `ORDER_NOT_FOUND` | 404 | No such order on the executing gateway |
//! | `GATEWAY_UNAVAILABLE` | 503 | Backend unreachable, nothing was placed |
//! | `EXECUTION_AMBIGUOUS` | 502 | Order may exist on the exchange, reconcile manually |
//! | `INTERNAL_ERROR` | 500 | Unexpected failure |

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::safety::SafetyViolation;

/// Error codes for the trading engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Malformed order request.
    InvalidOrder,
    /// Unknown or malformed trading mode.
    InvalidMode,
    /// Not enough balance for the order.
    InsufficientFunds,
    /// Risk limit exceeded.
    RiskLimitExceeded,
    /// Entry into live mode blocked by credential validation.
    CredentialValidation,
    /// A concurrent transition won the race.
    ModeSwitchInterrupted,
    /// Order not found on the executing gateway.
    OrderNotFound,
    /// Exchange backend unavailable; no order was placed.
    GatewayUnavailable,
    /// Order may have been placed; outcome unknown.
    ExecutionAmbiguous,
    /// Internal error.
    InternalError,
}

impl ErrorCode {
    /// HTTP status code for this error.
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::InvalidOrder | Self::InvalidMode => 400,
            Self::OrderNotFound => 404,
            Self::CredentialValidation | Self::ModeSwitchInterrupted => 409,
            Self::InsufficientFunds | Self::RiskLimitExceeded => 422,
            Self::InternalError => 500,
            Self::ExecutionAmbiguous => 502,
            Self::GatewayUnavailable => 503,
        }
    }

    /// Stable reason string.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::InvalidOrder => "INVALID_ORDER",
            Self::InvalidMode => "INVALID_MODE",
            Self::InsufficientFunds => "INSUFFICIENT_FUNDS",
            Self::RiskLimitExceeded => "RISK_LIMIT_EXCEEDED",
            Self::CredentialValidation => "CREDENTIAL_VALIDATION",
            Self::ModeSwitchInterrupted => "MODE_SWITCH_INTERRUPTED",
            Self::OrderNotFound => "ORDER_NOT_FOUND",
            Self::GatewayUnavailable => "GATEWAY_UNAVAILABLE",
            Self::ExecutionAmbiguous => "EXECUTION_AMBIGUOUS",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Whether the caller may retry the same request unchanged.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::GatewayUnavailable | Self::ModeSwitchInterrupted)
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.reason())
    }
}

/// A classified error with context.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct ExecutionError {
    code: ErrorCode,
    message: String,
    context: Vec<(String, String)>,
}

impl ExecutionError {
    /// Create a new error.
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: Vec::new(),
        }
    }

    /// Add context to the error.
    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.push((key.into(), value.into()));
        self
    }

    /// Error code.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        self.code
    }

    /// Message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Context pairs, in insertion order.
    #[must_use]
    pub fn context(&self) -> &[(String, String)] {
        &self.context
    }

    /// Look up one context value.
    #[must_use]
    pub fn context_value(&self, key: &str) -> Option<&str> {
        self.context
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Render as an HTTP error body.
    #[must_use]
    pub fn to_http_response(&self) -> HttpErrorResponse {
        HttpErrorResponse {
            code: self.code.reason().to_string(),
            message: self.message.clone(),
            details: self.context.iter().cloned().collect(),
        }
    }
}

impl std::fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code.reason(), self.message)
    }
}

/// HTTP error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpErrorResponse {
    /// Error code string.
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// Additional details.
    pub details: HashMap<String, String>,
}

/// Convenience constructors.
impl ExecutionError {
    /// Malformed order.
    #[must_use]
    pub fn invalid_order(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidOrder, message)
    }

    /// Unknown trading mode.
    #[must_use]
    pub fn invalid_mode(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidMode, message)
    }

    /// Live mode blocked by credentials.
    #[must_use]
    pub fn credential_validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::CredentialValidation, message)
    }

    /// Backend unavailable, nothing placed.
    #[must_use]
    pub fn gateway_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::GatewayUnavailable, message)
    }

    /// Placement outcome unknown.
    #[must_use]
    pub fn execution_ambiguous(
        message: impl Into<String>,
        client_order_id: &str,
        exchange_order_id: Option<&str>,
    ) -> Self {
        let error = Self::new(ErrorCode::ExecutionAmbiguous, message)
            .with_context("client_order_id", client_order_id);
        match exchange_order_id {
            Some(id) => error.with_context("exchange_order_id", id),
            None => error,
        }
    }

    /// Order not found.
    #[must_use]
    pub fn order_not_found(order_id: &str) -> Self {
        Self::new(ErrorCode::OrderNotFound, format!("Order {order_id} not found"))
            .with_context("order_id", order_id)
    }

    /// Internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl From<SafetyViolation> for ExecutionError {
    fn from(violation: SafetyViolation) -> Self {
        let message = violation.to_string();
        match violation {
            SafetyViolation::InvalidOrder { .. } => Self::invalid_order(message),
            SafetyViolation::InsufficientFunds {
                asset,
                required,
                available,
            } => Self::new(ErrorCode::InsufficientFunds, message)
                .with_context("asset", asset)
                .with_context("required", required.to_string())
                .with_context("available", available.to_string()),
            SafetyViolation::RiskLimitExceeded {
                limit,
                mode,
                observed,
                maximum,
            } => Self::new(ErrorCode::RiskLimitExceeded, message)
                .with_context("limit", limit)
                .with_context("mode", mode.as_str())
                .with_context("observed", observed.to_string())
                .with_context("maximum", maximum.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_mapping() {
        assert_eq!(ErrorCode::InvalidOrder.http_status(), 400);
        assert_eq!(ErrorCode::InsufficientFunds.http_status(), 422);
        assert_eq!(ErrorCode::CredentialValidation.http_status(), 409);
        assert_eq!(ErrorCode::GatewayUnavailable.http_status(), 503);
        assert_eq!(ErrorCode::ExecutionAmbiguous.http_status(), 502);
    }

    #[test]
    fn ambiguous_error_carries_exchange_id() {
        let error = ExecutionError::execution_ambiguous("timed out", "c-1", Some("ex-9"));
        assert_eq!(error.code(), ErrorCode::ExecutionAmbiguous);
        assert_eq!(error.context_value("exchange_order_id"), Some("ex-9"));
        assert_eq!(error.context_value("client_order_id"), Some("c-1"));

        let response = error.to_http_response();
        assert_eq!(response.code, "EXECUTION_AMBIGUOUS");
        assert_eq!(response.details.get("exchange_order_id").unwrap(), "ex-9");
    }

    #[test]
    fn ambiguity_is_never_retryable() {
        assert!(!ErrorCode::ExecutionAmbiguous.is_retryable());
        assert!(ErrorCode::GatewayUnavailable.is_retryable());
    }

    #[test]
    fn insufficient_funds_keeps_amounts() {
        let error: ExecutionError = SafetyViolation::InsufficientFunds {
            asset: "EUR".to_string(),
            required: rust_decimal_macros::dec!(50000),
            available: rust_decimal_macros::dec!(1000),
        }
        .into();
        assert_eq!(error.code(), ErrorCode::InsufficientFunds);
        assert_eq!(error.context_value("required"), Some("50000"));
    }

    #[test]
    fn error_display() {
        let error = ExecutionError::invalid_order("amount must be positive");
        assert_eq!(error.to_string(), "[INVALID_ORDER] amount must be positive");
    }
}
