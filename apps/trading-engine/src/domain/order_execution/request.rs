//! Order request.

use rust_decimal::Decimal;
use serde::Serialize;

use super::{OrderSide, OrderType};
use crate::domain::shared::Market;

/// An order proposal.
///
/// Construction does not validate amounts or prices; that is the safety
/// validator's job, so that every rejection carries the same taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderRequest {
    market: Market,
    side: OrderSide,
    order_type: OrderType,
    amount: Decimal,
    limit_price: Option<Decimal>,
    stop_loss_price: Option<Decimal>,
    take_profit_price: Option<Decimal>,
}

impl OrderRequest {
    /// Build a request from its parts.
    #[must_use]
    pub const fn new(
        market: Market,
        side: OrderSide,
        order_type: OrderType,
        amount: Decimal,
        limit_price: Option<Decimal>,
    ) -> Self {
        Self {
            market,
            side,
            order_type,
            amount,
            limit_price,
            stop_loss_price: None,
            take_profit_price: None,
        }
    }

    /// Market order.
    #[must_use]
    pub const fn market_order(market: Market, side: OrderSide, amount: Decimal) -> Self {
        Self::new(market, side, OrderType::Market, amount, None)
    }

    /// Limit order.
    #[must_use]
    pub const fn limit_order(
        market: Market,
        side: OrderSide,
        amount: Decimal,
        limit_price: Decimal,
    ) -> Self {
        Self::new(market, side, OrderType::Limit, amount, Some(limit_price))
    }

    /// Attach a stop-loss trigger price.
    #[must_use]
    pub const fn with_stop_loss(mut self, price: Decimal) -> Self {
        self.stop_loss_price = Some(price);
        self
    }

    /// Attach a take-profit price.
    #[must_use]
    pub const fn with_take_profit(mut self, price: Decimal) -> Self {
        self.take_profit_price = Some(price);
        self
    }

    /// Trading pair.
    #[must_use]
    pub const fn market(&self) -> &Market {
        &self.market
    }

    /// Side.
    #[must_use]
    pub const fn side(&self) -> OrderSide {
        self.side
    }

    /// Market or limit.
    #[must_use]
    pub const fn order_type(&self) -> OrderType {
        self.order_type
    }

    /// Base-asset amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.amount
    }

    /// Limit price, if any.
    #[must_use]
    pub const fn limit_price(&self) -> Option<Decimal> {
        self.limit_price
    }

    /// Stop-loss trigger price, if any.
    #[must_use]
    pub const fn stop_loss_price(&self) -> Option<Decimal> {
        self.stop_loss_price
    }

    /// Take-profit price, if any.
    #[must_use]
    pub const fn take_profit_price(&self) -> Option<Decimal> {
        self.take_profit_price
    }

    /// Price used for notional checks: the limit price for limit orders,
    /// the supplied estimate for market orders.
    #[must_use]
    pub fn reference_price(&self, market_estimate: Decimal) -> Decimal {
        match self.order_type {
            OrderType::Limit => self.limit_price.unwrap_or(market_estimate),
            OrderType::Market => market_estimate,
        }
    }
}
