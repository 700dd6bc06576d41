//! Simulated exchange backing the dry-run and demo gateways.
//!
//! Keeps balances and orders in memory. Market orders and marketable
//! limit orders fill immediately against a fixed reference price; other
//! limit orders rest and reserve funds until cancelled. Finished orders
//! are kept up to `order_retention`, oldest dropped first; open orders
//! are never dropped.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::application::ports::{ExchangePort, GatewayError};
use crate::domain::order_execution::{
    AssetBalance, BalanceSnapshot, BookLevel, ExchangeOrder, OrderBook, OrderRequest, OrderSide,
    OrderStatus, OrderType,
};
use crate::domain::shared::{ClientOrderId, ExchangeOrderId, Market};

const BASIS_POINTS: Decimal = dec!(10000);
const BOOK_HALF_SPREAD: Decimal = dec!(0.0005);
const PRECISION: u32 = 8;

/// Simulator parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulatorSettings {
    /// Starting balances by asset.
    pub initial_balances: BTreeMap<String, Decimal>,
    /// Reference price by market symbol.
    pub reference_prices: HashMap<String, Decimal>,
    /// Fee as a fraction of notional.
    pub fee_rate: Decimal,
    /// Largest adverse slippage applied to fills, in basis points.
    pub max_slippage_bps: u32,
    /// Finished (filled, cancelled, rejected) orders kept for lookups.
    pub order_retention: usize,
}

impl Default for SimulatorSettings {
    fn default() -> Self {
        Self {
            initial_balances: [("EUR", dec!(10000)), ("BTC", dec!(0.1)), ("ETH", dec!(1))]
                .into_iter()
                .map(|(asset, amount)| (asset.to_string(), amount))
                .collect(),
            reference_prices: [
                ("BTC-EUR", dec!(50000)),
                ("ETH-EUR", dec!(3000)),
                ("ADA-EUR", dec!(0.5)),
                ("DOT-EUR", dec!(7)),
            ]
            .into_iter()
            .map(|(market, price)| (market.to_string(), price))
            .collect(),
            fee_rate: dec!(0.0025),
            max_slippage_bps: 0,
            order_retention: 10_000,
        }
    }
}

#[derive(Debug, Default)]
struct Book {
    balances: BalanceSnapshot,
    orders: HashMap<ExchangeOrderId, ExchangeOrder>,
    by_client_id: HashMap<ClientOrderId, ExchangeOrderId>,
    finished: VecDeque<ExchangeOrderId>,
    retention: usize,
}

impl Book {
    fn order_by_client_id(&self, client_order_id: &ClientOrderId) -> Option<&ExchangeOrder> {
        self.by_client_id
            .get(client_order_id)
            .and_then(|order_id| self.orders.get(order_id))
    }

    fn insert(&mut self, order: ExchangeOrder) {
        if let Some(client_order_id) = &order.client_order_id {
            self.by_client_id
                .insert(client_order_id.clone(), order.order_id.clone());
        }
        let finished = order.status != OrderStatus::Open;
        let order_id = order.order_id.clone();
        self.orders.insert(order_id.clone(), order);
        if finished {
            self.finish(order_id);
        }
    }

    /// Queue a no-longer-open order for eviction and drop the oldest
    /// finished orders beyond the retention limit.
    fn finish(&mut self, order_id: ExchangeOrderId) {
        self.finished.push_back(order_id);
        while self.finished.len() > self.retention {
            let Some(evicted) = self.finished.pop_front() else {
                break;
            };
            if let Some(order) = self.orders.remove(&evicted)
                && let Some(client_order_id) = order.client_order_id
            {
                self.by_client_id.remove(&client_order_id);
            }
        }
    }

    fn adjust(&mut self, asset: &str, available: Decimal, reserved: Decimal) {
        let current = self.balances.get(asset);
        self.balances.insert(
            asset,
            AssetBalance {
                available: current.available + available,
                reserved: current.reserved + reserved,
            },
        );
    }
}

/// In-memory exchange.
#[derive(Debug)]
pub struct SimulatedExchange {
    name: &'static str,
    settings: SimulatorSettings,
    book: Mutex<Book>,
}

impl SimulatedExchange {
    /// Create a simulator named `name` (shown in logs and gateway status).
    #[must_use]
    pub fn new(name: &'static str, settings: SimulatorSettings) -> Self {
        let balances = settings
            .initial_balances
            .iter()
            .map(|(asset, amount)| (asset.clone(), AssetBalance::available(*amount)))
            .collect();
        Self {
            name,
            book: Mutex::new(Book {
                balances,
                retention: settings.order_retention.max(1),
                ..Book::default()
            }),
            settings,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Book> {
        self.book.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn reference_price(&self, market: &Market) -> Result<Decimal, GatewayError> {
        self.settings
            .reference_prices
            .get(&market.to_string())
            .copied()
            .ok_or_else(|| GatewayError::NotFound {
                what: format!("market {market}"),
            })
    }

    /// Adverse slippage factor for one fill.
    fn slippage(&self) -> Decimal {
        if self.settings.max_slippage_bps == 0 {
            return Decimal::ZERO;
        }
        let bps = rand::rng().random_range(0..=self.settings.max_slippage_bps);
        Decimal::from(bps) / BASIS_POINTS
    }

    /// Fill price, or `None` when a limit order is not marketable.
    fn fill_price(&self, request: &OrderRequest, reference: Decimal) -> Option<Decimal> {
        let slip = self.slippage();
        let price = match (request.side(), request.limit_price()) {
            (OrderSide::Buy, None) => reference * (Decimal::ONE + slip),
            (OrderSide::Sell, None) => reference * (Decimal::ONE - slip),
            (OrderSide::Buy, Some(limit)) if limit >= reference => {
                (reference * (Decimal::ONE + slip)).min(limit)
            }
            (OrderSide::Sell, Some(limit)) if limit <= reference => {
                (reference * (Decimal::ONE - slip)).max(limit)
            }
            (_, Some(_)) => return None,
        };
        Some(price.round_dp(PRECISION))
    }

    fn fee(&self, notional: Decimal) -> Decimal {
        (notional * self.settings.fee_rate).round_dp(PRECISION)
    }

    fn new_order(
        request: &OrderRequest,
        client_order_id: &ClientOrderId,
        status: OrderStatus,
    ) -> ExchangeOrder {
        let now = Utc::now();
        ExchangeOrder {
            order_id: ExchangeOrderId::simulated(),
            client_order_id: Some(client_order_id.clone()),
            market: request.market().clone(),
            side: request.side(),
            order_type: request.order_type(),
            status,
            amount: request.amount(),
            price: request.limit_price(),
            filled_amount: Decimal::ZERO,
            average_price: None,
            fee: Decimal::ZERO,
            fee_currency: request.market().quote().to_string(),
            reject_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn reject(mut order: ExchangeOrder, reason: String) -> ExchangeOrder {
        order.status = OrderStatus::Rejected;
        order.reject_reason = Some(reason);
        order
    }

    fn execute(&self, book: &mut Book, request: &OrderRequest, client_order_id: &ClientOrderId) -> Result<ExchangeOrder, GatewayError> {
        let market = request.market();
        let (base, quote) = (market.base(), market.quote());
        let reference = self.reference_price(market)?;
        let amount = request.amount();

        let Some(price) = self.fill_price(request, reference) else {
            return Ok(self.rest(book, request, client_order_id));
        };
        let notional = (amount * price).round_dp(PRECISION);
        let fee = self.fee(notional);
        let order = Self::new_order(request, client_order_id, OrderStatus::Filled);

        match request.side() {
            OrderSide::Buy => {
                let required = notional + fee;
                let available = book.balances.available(quote);
                if required > available {
                    return Ok(Self::reject(
                        order,
                        format!("insufficient {quote}: required {required}, available {available}"),
                    ));
                }
                book.adjust(quote, -required, Decimal::ZERO);
                book.adjust(base, amount, Decimal::ZERO);
            }
            OrderSide::Sell => {
                let available = book.balances.available(base);
                if amount > available {
                    return Ok(Self::reject(
                        order,
                        format!("insufficient {base}: required {amount}, available {available}"),
                    ));
                }
                book.adjust(base, -amount, Decimal::ZERO);
                book.adjust(quote, notional - fee, Decimal::ZERO);
            }
        }

        Ok(ExchangeOrder {
            filled_amount: amount,
            average_price: Some(price),
            fee,
            ..order
        })
    }

    /// Rest a non-marketable limit order, reserving what it would spend.
    fn rest(&self, book: &mut Book, request: &OrderRequest, client_order_id: &ClientOrderId) -> ExchangeOrder {
        let market = request.market();
        let order = Self::new_order(request, client_order_id, OrderStatus::Open);
        let (asset, reserve) = self.reservation(&order);
        let available = book.balances.available(&asset);
        if reserve > available {
            return Self::reject(
                order,
                format!("insufficient {asset}: required {reserve}, available {available}"),
            );
        }
        book.adjust(&asset, -reserve, reserve);
        tracing::debug!(simulator = self.name, %market, order_id = %order.order_id, "Limit order resting");
        order
    }

    /// Asset and amount an open order holds in reserve.
    fn reservation(&self, order: &ExchangeOrder) -> (String, Decimal) {
        match order.side {
            OrderSide::Buy => {
                let notional = (order.amount * order.price.unwrap_or_default()).round_dp(PRECISION);
                (order.market.quote().to_string(), notional + self.fee(notional))
            }
            OrderSide::Sell => (order.market.base().to_string(), order.amount),
        }
    }
}

#[async_trait]
impl ExchangePort for SimulatedExchange {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn ticker_price(&self, market: &Market) -> Result<Decimal, GatewayError> {
        self.reference_price(market)
    }

    async fn order_book(&self, market: &Market, depth: usize) -> Result<OrderBook, GatewayError> {
        let reference = self.reference_price(market)?;
        let level = |price: Decimal| BookLevel {
            price: price.round_dp(PRECISION),
            amount: Decimal::ONE,
        };
        let (bids, asks) = if depth == 0 {
            (Vec::new(), Vec::new())
        } else {
            (
                vec![level(reference * (Decimal::ONE - BOOK_HALF_SPREAD))],
                vec![level(reference * (Decimal::ONE + BOOK_HALF_SPREAD))],
            )
        };
        Ok(OrderBook {
            market: market.clone(),
            bids,
            asks,
        })
    }

    async fn balance(&self) -> Result<BalanceSnapshot, GatewayError> {
        Ok(self.lock().balances.clone())
    }

    async fn place_order(
        &self,
        request: &OrderRequest,
        client_order_id: &ClientOrderId,
    ) -> Result<ExchangeOrder, GatewayError> {
        let mut book = self.lock();

        if let Some(existing) = book.order_by_client_id(client_order_id) {
            return Ok(existing.clone());
        }

        let order = self.execute(&mut book, request, client_order_id)?;
        tracing::info!(
            simulator = self.name,
            order_id = %order.order_id,
            market = %order.market,
            side = %order.side,
            order_type = %order.order_type,
            status = %order.status,
            amount = %order.amount,
            price = ?order.average_price,
            "Simulated order"
        );
        book.insert(order.clone());
        Ok(order)
    }

    async fn get_order(
        &self,
        _market: &Market,
        order_id: &ExchangeOrderId,
    ) -> Result<ExchangeOrder, GatewayError> {
        self.lock()
            .orders
            .get(order_id)
            .cloned()
            .ok_or_else(|| GatewayError::NotFound {
                what: format!("order {order_id}"),
            })
    }

    async fn find_order_by_client_id(
        &self,
        _market: &Market,
        client_order_id: &ClientOrderId,
    ) -> Result<Option<ExchangeOrder>, GatewayError> {
        Ok(self.lock().order_by_client_id(client_order_id).cloned())
    }

    async fn cancel_order(
        &self,
        _market: &Market,
        order_id: &ExchangeOrderId,
    ) -> Result<ExchangeOrder, GatewayError> {
        let mut book = self.lock();
        let order = book
            .orders
            .get_mut(order_id)
            .ok_or_else(|| GatewayError::NotFound {
                what: format!("order {order_id}"),
            })?;

        match order.status {
            OrderStatus::Cancelled => return Ok(order.clone()),
            OrderStatus::Open => {}
            status => {
                return Err(GatewayError::Rejected {
                    reason: format!("order {order_id} is {status} and cannot be cancelled"),
                });
            }
        }

        order.status = OrderStatus::Cancelled;
        order.updated_at = Utc::now();
        let cancelled = order.clone();
        let (asset, reserved) = self.reservation(&cancelled);
        book.adjust(&asset, reserved, -reserved);
        book.finish(cancelled.order_id.clone());
        Ok(cancelled)
    }

    async fn open_orders(&self, market: Option<&Market>) -> Result<Vec<ExchangeOrder>, GatewayError> {
        let mut open: Vec<ExchangeOrder> = self
            .lock()
            .orders
            .values()
            .filter(|o| o.status == OrderStatus::Open)
            .filter(|o| market.is_none_or(|m| &o.market == m))
            .cloned()
            .collect();
        open.sort_by_key(|o| o.created_at);
        Ok(open)
    }

    async fn health_check(&self) -> Result<(), GatewayError> {
        Ok(())
    }
}
