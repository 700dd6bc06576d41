//! Order execution domain: requests, exchange reports, mode-stamped results
//! and balances.

mod balance;
mod report;
mod request;
mod result;
mod value_objects;

pub use balance::{AssetBalance, BalanceSnapshot};
pub use report::{BookLevel, ExchangeOrder, OrderBook};
pub use request::OrderRequest;
pub use result::{OrderResult, ProtectiveKind, ProtectiveOrder, Venue};
pub use value_objects::{OrderSide, OrderStatus, OrderType};
