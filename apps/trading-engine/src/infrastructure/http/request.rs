//! HTTP request DTOs.
//!
//! Field names are snake_case; the camelCase spellings used by browser
//! clients are accepted as aliases.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::order_execution::{OrderRequest, OrderSide, OrderType};
use crate::domain::shared::{ClientOrderId, Market};
use crate::domain::trading_mode::TradingMode;
use crate::error::ExecutionError;

/// Journal entries returned when no limit is given.
pub const DEFAULT_JOURNAL_LIMIT: usize = 50;
/// Largest journal page.
pub const MAX_JOURNAL_LIMIT: usize = 1000;

/// Body of `POST /api/v1/trading-mode/set`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetModeRequest {
    /// `dry_run`, `demo` or `live`.
    pub mode: String,
    /// Keep the dry-run lock engaged.
    #[serde(default, alias = "forceDryRun")]
    pub force_dry_run: bool,
}

impl SetModeRequest {
    /// Parse the requested mode.
    pub fn target(&self) -> Result<TradingMode, ExecutionError> {
        self.mode.parse().map_err(|_| {
            ExecutionError::invalid_mode(format!(
                "Invalid trading mode: {}. Options: dry_run, demo, live",
                self.mode
            ))
        })
    }
}

/// Body of `POST /api/v1/trading/order`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceOrderRequest {
    /// Trading pair, e.g. `BTC-EUR`.
    pub market: String,
    /// `buy` or `sell`.
    pub side: OrderSide,
    /// `market` (default) or `limit`.
    #[serde(default = "default_order_type", alias = "orderType")]
    pub order_type: OrderType,
    /// Base amount.
    pub amount: Decimal,
    /// Limit price.
    #[serde(default)]
    pub price: Option<Decimal>,
    /// Stop-loss trigger.
    #[serde(default, alias = "stopLossPrice")]
    pub stop_loss_price: Option<Decimal>,
    /// Take-profit trigger.
    #[serde(default, alias = "takeProfitPrice")]
    pub take_profit_price: Option<Decimal>,
    /// Idempotency key (UUID). Generated when absent.
    #[serde(default, alias = "clientOrderId")]
    pub client_order_id: Option<String>,
}

const fn default_order_type() -> OrderType {
    OrderType::Market
}

impl PlaceOrderRequest {
    /// Convert into the domain request and its idempotency key.
    pub fn into_domain(self) -> Result<(OrderRequest, ClientOrderId), ExecutionError> {
        let market: Market = self
            .market
            .parse()
            .map_err(|e| ExecutionError::invalid_order(format!("{e}")))?;

        let client_order_id = match self.client_order_id {
            None => ClientOrderId::generate(),
            Some(raw) => {
                let parsed = uuid::Uuid::parse_str(&raw).map_err(|_| {
                    ExecutionError::invalid_order(format!(
                        "client_order_id must be a UUID, got '{raw}'"
                    ))
                })?;
                ClientOrderId::new(parsed.hyphenated().to_string())
            }
        };

        let mut request =
            OrderRequest::new(market, self.side, self.order_type, self.amount, self.price);
        if let Some(price) = self.stop_loss_price {
            request = request.with_stop_loss(price);
        }
        if let Some(price) = self.take_profit_price {
            request = request.with_take_profit(price);
        }

        Ok((request, client_order_id))
    }
}

/// Query of `GET /api/v1/trading/open-orders`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OpenOrdersQuery {
    /// Restrict to one market.
    pub market: Option<String>,
}

impl OpenOrdersQuery {
    /// Parsed market filter.
    pub fn market(&self) -> Result<Option<Market>, ExecutionError> {
        self.market
            .as_deref()
            .map(str::parse::<Market>)
            .transpose()
            .map_err(|e| ExecutionError::invalid_order(format!("{e}")))
    }
}

/// Query of `GET /api/v1/trading/orders`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JournalQuery {
    /// Page size.
    pub limit: Option<usize>,
}

impl JournalQuery {
    /// Effective page size.
    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
            .unwrap_or(DEFAULT_JOURNAL_LIMIT)
            .clamp(1, MAX_JOURNAL_LIMIT)
    }
}
