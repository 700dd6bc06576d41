//! Bitvavo REST request and response types.
//!
//! Amounts travel as decimal strings; timestamps as epoch milliseconds.

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::order_execution::{
    AssetBalance, BalanceSnapshot, BookLevel, ExchangeOrder, OrderBook, OrderSide, OrderStatus,
    OrderType,
};
use crate::domain::shared::{ClientOrderId, ExchangeOrderId, Market};

// ============================================================================
// Requests
// ============================================================================

/// Body of `POST /order`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderBody {
    pub market: String,
    pub side: &'static str,
    pub order_type: &'static str,
    pub amount: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    pub client_order_id: String,
}

// ============================================================================
// Responses
// ============================================================================

/// `GET /time`.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerTime {
    pub time: i64,
}

/// `GET /ticker/price?market=`.
#[derive(Debug, Clone, Deserialize)]
#[allow(dead_code)]
pub struct TickerPrice {
    pub market: String,
    pub price: Decimal,
}

/// One entry of `GET /balance`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceEntry {
    pub symbol: String,
    pub available: Decimal,
    #[serde(default)]
    pub in_order: Decimal,
}

/// `GET /<market>/book`. Levels are `[price, size]` string pairs.
#[derive(Debug, Clone, Deserialize)]
#[allow(dead_code)]
pub struct BookResponse {
    pub market: String,
    #[serde(default)]
    pub bids: Vec<(Decimal, Decimal)>,
    #[serde(default)]
    pub asks: Vec<(Decimal, Decimal)>,
}

/// Order as returned by every order endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub order_id: String,
    #[serde(default)]
    pub client_order_id: Option<String>,
    pub market: String,
    pub created: i64,
    #[serde(default)]
    pub updated: Option<i64>,
    pub status: String,
    pub side: String,
    pub order_type: String,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub filled_amount: Decimal,
    #[serde(default)]
    pub filled_amount_quote: Decimal,
    #[serde(default)]
    pub fee_paid: Decimal,
    #[serde(default)]
    pub fee_currency: Option<String>,
}

/// `DELETE /order` answers with the id only.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelResponse {
    pub order_id: String,
}

/// Error body: `{"errorCode": 205, "error": "..."}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error_code: i64,
    pub error: String,
}

/// `errorCode` Bitvavo returns when an order lookup matches nothing.
pub const ORDER_NOT_FOUND_CODE: i64 = 240;

// ============================================================================
// Conversions
// ============================================================================

pub fn balance_snapshot(entries: Vec<BalanceEntry>) -> BalanceSnapshot {
    entries
        .into_iter()
        .map(|entry| {
            (
                entry.symbol,
                AssetBalance {
                    available: entry.available,
                    reserved: entry.in_order,
                },
            )
        })
        .collect()
}

pub fn order_book(market: &Market, response: BookResponse, depth: usize) -> OrderBook {
    let levels = |raw: Vec<(Decimal, Decimal)>| {
        raw.into_iter()
            .take(depth)
            .map(|(price, amount)| BookLevel { price, amount })
            .collect()
    };
    OrderBook {
        market: market.clone(),
        bids: levels(response.bids),
        asks: levels(response.asks),
    }
}

fn order_status(raw: &str) -> OrderStatus {
    match raw {
        "filled" => OrderStatus::Filled,
        "canceled" | "cancelled" | "expired" => OrderStatus::Cancelled,
        "rejected" => OrderStatus::Rejected,
        // new, awaitingTrigger, partiallyFilled
        _ => OrderStatus::Open,
    }
}

fn timestamp(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .unwrap_or_else(Utc::now)
}

impl OrderResponse {
    /// Convert to the gateway report, failing on fields we cannot interpret.
    pub fn into_report(self) -> Result<ExchangeOrder, String> {
        let market: Market = self.market.parse().map_err(|e| format!("{e}"))?;
        let side = match self.side.as_str() {
            "buy" => OrderSide::Buy,
            "sell" => OrderSide::Sell,
            other => return Err(format!("unknown side '{other}'")),
        };
        let order_type = match self.order_type.as_str() {
            "market" => OrderType::Market,
            "limit" => OrderType::Limit,
            other => return Err(format!("unsupported order type '{other}'")),
        };
        let average_price = (self.filled_amount > Decimal::ZERO)
            .then(|| self.filled_amount_quote / self.filled_amount);
        let created_at = timestamp(self.created);

        Ok(ExchangeOrder {
            order_id: ExchangeOrderId::new(self.order_id),
            client_order_id: self.client_order_id.map(ClientOrderId::new),
            fee_currency: self
                .fee_currency
                .unwrap_or_else(|| market.quote().to_string()),
            market,
            side,
            order_type,
            status: order_status(&self.status),
            amount: self.amount.unwrap_or(self.filled_amount),
            price: self.price,
            filled_amount: self.filled_amount,
            average_price,
            fee: self.fee_paid,
            reject_reason: None,
            created_at,
            updated_at: self.updated.map_or(created_at, timestamp),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn decodes_filled_market_order() {
        let raw = r#"{
            "orderId": "1be6d0df-d5dc-4b53-a250-3376f3b393e6",
            "clientOrderId": "2be7d0df-d5dc-4b53-a250-3376f3b393e6",
            "market": "BTC-EUR",
            "created": 1700000000000,
            "updated": 1700000000100,
            "status": "filled",
            "side": "buy",
            "orderType": "market",
            "amount": "0.01",
            "amountRemaining": "0",
            "onHold": "0",
            "filledAmount": "0.01",
            "filledAmountQuote": "500.5",
            "feePaid": "1.25",
            "feeCurrency": "EUR",
            "fills": []
        }"#;

        let order: OrderResponse = serde_json::from_str(raw).unwrap();
        let report = order.into_report().unwrap();

        assert_eq!(report.status, OrderStatus::Filled);
        assert_eq!(report.average_price, Some(dec!(50050)));
        assert_eq!(report.fee, dec!(1.25));
        assert_eq!(
            report.client_order_id.unwrap().as_str(),
            "2be7d0df-d5dc-4b53-a250-3376f3b393e6"
        );
    }

    #[test]
    fn resting_limit_order_is_open() {
        let raw = r#"{"orderId":"x","market":"ETH-EUR","created":1700000000000,
            "status":"new","side":"sell","orderType":"limit","amount":"1","price":"3000"}"#;
        let report = serde_json::from_str::<OrderResponse>(raw)
            .unwrap()
            .into_report()
            .unwrap();

        assert_eq!(report.status, OrderStatus::Open);
        assert_eq!(report.filled_amount, Decimal::ZERO);
        assert_eq!(report.average_price, None);
        assert_eq!(report.fee_currency, "EUR");
    }

    #[test]
    fn stop_orders_are_not_interpreted() {
        let raw = r#"{"orderId":"x","market":"ETH-EUR","created":0,
            "status":"new","side":"sell","orderType":"stopLoss"}"#;
        let order: OrderResponse = serde_json::from_str(raw).unwrap();
        assert!(order.into_report().is_err());
    }

    #[test]
    fn balance_keeps_in_order_as_reserved() {
        let entries: Vec<BalanceEntry> = serde_json::from_str(
            r#"[{"symbol":"EUR","available":"900.5","inOrder":"99.5"}]"#,
        )
        .unwrap();
        let snapshot = balance_snapshot(entries);
        assert_eq!(snapshot.get("EUR").total(), dec!(1000));
    }

    #[test]
    fn new_order_body_uses_wire_names() {
        let body = NewOrderBody {
            market: "BTC-EUR".into(),
            side: "buy",
            order_type: "limit",
            amount: "0.01".into(),
            price: Some("50000".into()),
            client_order_id: "abc".into(),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["orderType"], "limit");
        assert_eq!(json["clientOrderId"], "abc");
    }
}
