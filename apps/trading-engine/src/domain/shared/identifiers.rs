//! Strongly-typed order identifiers.
//!
//! The client order id is the idempotency key we generate before placing an
//! order; the exchange order id is whatever the executing backend assigns.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap an existing identifier.
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Borrow the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

define_id!(
    ClientOrderId,
    "Idempotency key attached to an order before it is sent to any exchange."
);
define_id!(ExchangeOrderId, "Order identifier assigned by the executing exchange.");

impl ClientOrderId {
    /// Generate a fresh idempotency key (UUID v4).
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl ExchangeOrderId {
    /// Generate a simulated-exchange order id of the form `SIM-XXXXXXXX`.
    #[must_use]
    pub fn simulated() -> Self {
        let hex = uuid::Uuid::new_v4().simple().to_string();
        Self(format!("SIM-{}", hex[..8].to_uppercase()))
    }

    /// Whether this id was issued by the simulated exchange.
    #[must_use]
    pub fn is_simulated(&self) -> bool {
        self.0.starts_with("SIM-")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_order_ids_are_unique() {
        assert_ne!(ClientOrderId::generate(), ClientOrderId::generate());
    }

    #[test]
    fn simulated_exchange_id_format() {
        let id = ExchangeOrderId::simulated();
        assert!(id.is_simulated());
        assert_eq!(id.as_str().len(), 12);
        assert!(
            id.as_str()[4..]
                .chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase())
        );
    }

    #[test]
    fn ids_serialize_transparently() {
        let id = ExchangeOrderId::new("abc-1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc-1\"");
    }
}
