//! Shared kernel: identifiers and value objects used across the domain.

mod identifiers;
mod market;

pub use identifiers::{ClientOrderId, ExchangeOrderId};
pub use market::{Market, MarketParseError};
