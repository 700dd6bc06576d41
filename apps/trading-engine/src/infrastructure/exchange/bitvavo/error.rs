//! Bitvavo-specific error types.

use std::time::Duration;

use thiserror::Error;

use crate::application::ports::GatewayError;

/// Errors from the Bitvavo REST client.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BitvavoError {
    /// The request never reached the exchange.
    #[error("connection failed: {0}")]
    Connect(String),

    /// The request was sent but no answer arrived in time.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// The exchange answered a read with a server-side failure.
    #[error("exchange unavailable (HTTP {status}): {message}")]
    Server {
        /// HTTP status.
        status: u16,
        /// Exchange message.
        message: String,
    },

    /// A state-changing request was sent and answered with a server-side
    /// failure. The exchange may have applied it.
    #[error("unconfirmed (HTTP {status}): {message}")]
    Unconfirmed {
        /// HTTP status.
        status: u16,
        /// Exchange message.
        message: String,
    },

    /// Rate limited.
    #[error("rate limited")]
    RateLimited {
        /// Suggested delay.
        retry_after: Option<Duration>,
    },

    /// Key, signature or permissions refused.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The exchange refused the request.
    #[error("exchange error {code}: {message}")]
    Api {
        /// Bitvavo `errorCode`.
        code: i64,
        /// Bitvavo `error`.
        message: String,
    },

    /// Referenced entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The response body could not be interpreted.
    #[error("unexpected response: {0}")]
    Decode(String),

    /// Local failure building the request.
    #[error("request error: {0}")]
    Request(String),
}

impl From<BitvavoError> for GatewayError {
    fn from(err: BitvavoError) -> Self {
        match err {
            BitvavoError::Connect(message) | BitvavoError::Request(message) => {
                Self::Unavailable { message }
            }
            BitvavoError::Server { status, message } if status == 504 => Self::Timeout {
                message: format!("gateway timeout: {message}"),
            },
            BitvavoError::Server { status, message } => Self::Unavailable {
                message: format!("HTTP {status}: {message}"),
            },
            BitvavoError::Unconfirmed { status, message } => Self::Timeout {
                message: format!("HTTP {status} after sending, outcome unknown: {message}"),
            },
            BitvavoError::Timeout(message) => Self::Timeout { message },
            BitvavoError::RateLimited { retry_after } => Self::RateLimited { retry_after },
            BitvavoError::Authentication(message) => Self::Authentication { message },
            BitvavoError::Api { code, message } => Self::Rejected {
                reason: format!("{message} (code {code})"),
            },
            BitvavoError::NotFound(what) => Self::NotFound { what },
            BitvavoError::Decode(message) => Self::Protocol {
                message,
                order_id: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(BitvavoError::Connect("refused".into()), false ; "connect")]
    #[test_case(BitvavoError::Timeout("read".into()), true ; "timeout")]
    #[test_case(BitvavoError::Server { status: 504, message: String::new() }, true ; "gateway timeout")]
    #[test_case(BitvavoError::Server { status: 503, message: String::new() }, false ; "maintenance")]
    #[test_case(BitvavoError::Unconfirmed { status: 500, message: String::new() }, true ; "order post server error")]
    #[test_case(BitvavoError::Unconfirmed { status: 503, message: String::new() }, true ; "order post maintenance")]
    #[test_case(BitvavoError::Decode("eof".into()), true ; "garbled body")]
    #[test_case(BitvavoError::Api { code: 216, message: "Insufficient balance".into() }, false ; "rejected")]
    fn classifies_delivery_uncertainty(err: BitvavoError, may_have_executed: bool) {
        assert_eq!(GatewayError::from(err).may_have_executed(), may_have_executed);
    }

    #[test]
    fn rate_limit_hint_survives() {
        let hint = Some(Duration::from_secs(2));
        let err = GatewayError::from(BitvavoError::RateLimited { retry_after: hint });
        assert_eq!(err, GatewayError::RateLimited { retry_after: hint });
    }

    #[test]
    fn api_error_keeps_exchange_reason() {
        let err = GatewayError::from(BitvavoError::Api {
            code: 216,
            message: "Insufficient balance".into(),
        });
        let GatewayError::Rejected { reason } = err else {
            panic!("expected rejection");
        };
        assert!(reason.contains("Insufficient balance"));
    }
}
