//! What an exchange reports back about an order or a book.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{OrderSide, OrderStatus, OrderType};
use crate::domain::shared::{ClientOrderId, ExchangeOrderId, Market};

/// An order as the executing exchange (simulated or real) sees it.
///
/// This is the raw gateway report. It carries no trading mode; callers
/// receive an [`OrderResult`](super::OrderResult) built from it instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeOrder {
    /// Exchange-assigned id.
    pub order_id: ExchangeOrderId,
    /// Idempotency key the order was placed with, when the exchange echoes it.
    pub client_order_id: Option<ClientOrderId>,
    /// Trading pair.
    pub market: Market,
    /// Side.
    pub side: OrderSide,
    /// Market or limit.
    pub order_type: OrderType,
    /// Status.
    pub status: OrderStatus,
    /// Requested base amount.
    pub amount: Decimal,
    /// Limit price, if any.
    pub price: Option<Decimal>,
    /// Base amount filled so far.
    pub filled_amount: Decimal,
    /// Volume-weighted fill price.
    pub average_price: Option<Decimal>,
    /// Fee charged so far.
    pub fee: Decimal,
    /// Asset the fee is charged in.
    pub fee_currency: String,
    /// Exchange reason for a rejection.
    pub reject_reason: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

/// One price level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookLevel {
    /// Price.
    pub price: Decimal,
    /// Base amount available at that price.
    pub amount: Decimal,
}

/// Order book snapshot, best levels first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBook {
    /// Trading pair.
    pub market: Market,
    /// Bids, highest first.
    pub bids: Vec<BookLevel>,
    /// Asks, lowest first.
    pub asks: Vec<BookLevel>,
}
