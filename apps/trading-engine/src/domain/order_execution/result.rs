//! Mode-stamped order result.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{ExchangeOrder, OrderRequest, OrderSide, OrderStatus, OrderType};
use crate::domain::shared::{ClientOrderId, ExchangeOrderId, Market};
use crate::domain::trading_mode::TradingMode;

/// Which backend actually executed an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Venue {
    /// In-process simulated exchange.
    Simulated,
    /// Real exchange over the network.
    Exchange,
}

/// Kind of protective exit attached to a filled entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtectiveKind {
    /// Exit when price moves against the position.
    StopLoss,
    /// Exit when price reaches the target.
    TakeProfit,
}

/// Exit instruction derived from a filled order's stop-loss or take-profit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtectiveOrder {
    /// Stop-loss or take-profit.
    pub kind: ProtectiveKind,
    /// Always the opposite of the entry side.
    pub side: OrderSide,
    /// Filled amount of the entry.
    pub amount: Decimal,
    /// Trigger (stop-loss) or limit (take-profit) price.
    pub trigger_price: Decimal,
}

/// The outcome of one order execution.
///
/// `executing_mode` is the mode captured when execution began, never the
/// mode at the time the result was produced. Results can only be built
/// inside this crate, from a gateway report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct OrderResult {
    /// Exchange-assigned order id.
    pub order_id: ExchangeOrderId,
    /// Idempotency key the order was placed with.
    pub client_order_id: ClientOrderId,
    /// Status at the time the result was produced.
    pub status: OrderStatus,
    /// Trading mode captured at the start of execution.
    pub executing_mode: TradingMode,
    /// Whether the dry-run lock was engaged when execution began.
    pub dry_run: bool,
    /// Backend that executed the order.
    pub venue: Venue,
    /// Trading pair.
    pub market: Market,
    /// Side.
    pub side: OrderSide,
    /// Market or limit.
    pub order_type: OrderType,
    /// Requested base amount.
    pub amount: Decimal,
    /// Base amount filled.
    pub filled_amount: Decimal,
    /// Volume-weighted fill price.
    pub average_price: Option<Decimal>,
    /// Fee charged.
    pub fee: Decimal,
    /// Asset the fee is charged in.
    pub fee_currency: String,
    /// Exchange reason for a rejection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reject_reason: Option<String>,
    /// Exit instructions for a filled order with stop-loss or take-profit.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub protective_orders: Vec<ProtectiveOrder>,
    /// When the order was accepted by the exchange.
    pub submitted_at: DateTime<Utc>,
    /// Last exchange update.
    pub updated_at: DateTime<Utc>,
}

impl OrderResult {
    /// Stamp a gateway report with the captured mode.
    pub(crate) fn stamp(
        report: ExchangeOrder,
        client_order_id: ClientOrderId,
        executing_mode: TradingMode,
        dry_run: bool,
        venue: Venue,
        request: &OrderRequest,
    ) -> Self {
        let protective_orders = protective_orders_for(request, &report);
        Self {
            order_id: report.order_id,
            client_order_id,
            status: report.status,
            executing_mode,
            dry_run,
            venue,
            market: report.market,
            side: report.side,
            order_type: report.order_type,
            amount: report.amount,
            filled_amount: report.filled_amount,
            average_price: report.average_price,
            fee: report.fee,
            fee_currency: report.fee_currency,
            reject_reason: report.reject_reason,
            protective_orders,
            submitted_at: report.created_at,
            updated_at: report.updated_at,
        }
    }

    /// True only for an order that actually went to the real exchange in live mode.
    #[must_use]
    pub const fn is_live_execution(&self) -> bool {
        self.executing_mode.is_live() && matches!(self.venue, Venue::Exchange)
    }
}

fn protective_orders_for(request: &OrderRequest, report: &ExchangeOrder) -> Vec<ProtectiveOrder> {
    if report.filled_amount <= Decimal::ZERO {
        return Vec::new();
    }

    [
        (ProtectiveKind::StopLoss, request.stop_loss_price()),
        (ProtectiveKind::TakeProfit, request.take_profit_price()),
    ]
    .into_iter()
    .filter_map(|(kind, price)| {
        price.map(|trigger_price| ProtectiveOrder {
            kind,
            side: request.side().opposite(),
            amount: report.filled_amount,
            trigger_price,
        })
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn report(status: OrderStatus, filled: Decimal) -> ExchangeOrder {
        let now = Utc::now();
        ExchangeOrder {
            order_id: ExchangeOrderId::new("SIM-00000001"),
            client_order_id: None,
            market: "BTC-EUR".parse().unwrap(),
            side: OrderSide::Buy,
            order_type: OrderType::Market,
            status,
            amount: dec!(0.01),
            price: None,
            filled_amount: filled,
            average_price: Some(dec!(45000)),
            fee: dec!(1.125),
            fee_currency: "EUR".to_string(),
            reject_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn request() -> OrderRequest {
        OrderRequest::market_order("BTC-EUR".parse().unwrap(), OrderSide::Buy, dec!(0.01))
            .with_stop_loss(dec!(42750))
            .with_take_profit(dec!(49500))
    }

    #[test]
    fn filled_order_gets_opposite_side_exits() {
        let result = OrderResult::stamp(
            report(OrderStatus::Filled, dec!(0.01)),
            ClientOrderId::new("c-1"),
            TradingMode::Demo,
            true,
            Venue::Simulated,
            &request(),
        );

        assert_eq!(result.executing_mode, TradingMode::Demo);
        assert_eq!(result.protective_orders.len(), 2);
        assert!(
            result
                .protective_orders
                .iter()
                .all(|p| p.side == OrderSide::Sell && p.amount == dec!(0.01))
        );
        assert_eq!(result.protective_orders[0].kind, ProtectiveKind::StopLoss);
    }

    #[test]
    fn unfilled_order_has_no_exits() {
        let result = OrderResult::stamp(
            report(OrderStatus::Open, Decimal::ZERO),
            ClientOrderId::new("c-2"),
            TradingMode::DryRun,
            true,
            Venue::Simulated,
            &request(),
        );
        assert!(result.protective_orders.is_empty());
    }

    #[test]
    fn rehearsal_is_not_live_execution() {
        let result = OrderResult::stamp(
            report(OrderStatus::Filled, dec!(0.01)),
            ClientOrderId::new("c-3"),
            TradingMode::Live,
            true,
            Venue::Simulated,
            &request(),
        );
        assert!(!result.is_live_execution());
    }
}
