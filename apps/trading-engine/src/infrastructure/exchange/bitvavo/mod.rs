//! Bitvavo Exchange Adapter
//!
//! `ExchangePort` over the Bitvavo REST v2 API:
//! - HMAC-SHA256 signed requests
//! - Single-shot HTTP calls classified by delivery certainty
//! - Order lookup by client order id for idempotent placement

mod adapter;
mod api_types;
mod config;
mod error;
mod http_client;

pub use adapter::{BitvavoConnector, BitvavoExchange};
pub use config::{BitvavoConfig, DEFAULT_BASE_URL};
pub use error::BitvavoError;
pub use http_client::sign;
