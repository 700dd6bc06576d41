//! Scriptable exchange fakes for unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::ports::{CredentialSet, ExchangePort, GatewayError, RealExchangeConnector};
use crate::domain::order_execution::{
    AssetBalance, BalanceSnapshot, ExchangeOrder, OrderBook, OrderRequest, OrderStatus,
};
use crate::domain::shared::{ClientOrderId, ExchangeOrderId, Market};

/// What the next `place_order` call does.
#[derive(Debug, Clone)]
pub enum PlaceOutcome {
    /// Accept and fill.
    Accept,
    /// Fail without recording the order.
    Fail(GatewayError),
    /// Record the order, then report a failure.
    LandThenFail(GatewayError),
}

/// In-memory exchange whose failures can be scripted.
pub struct FakeExchange {
    name: &'static str,
    balance: Mutex<BalanceSnapshot>,
    price: Decimal,
    health: Mutex<Result<(), GatewayError>>,
    place_script: Mutex<VecDeque<PlaceOutcome>>,
    lookup_script: Mutex<VecDeque<GatewayError>>,
    placed: Mutex<Vec<ExchangeOrder>>,
    place_delay: Mutex<Duration>,
    pub place_calls: AtomicUsize,
    pub read_calls: AtomicUsize,
    pub lookup_calls: AtomicUsize,
    pub health_checks: AtomicUsize,
}

impl FakeExchange {
    pub fn new(name: &'static str) -> Self {
        let balance = [
            ("EUR", AssetBalance::available(dec!(10000))),
            ("BTC", AssetBalance::available(dec!(1))),
        ]
        .into_iter()
        .collect();
        Self {
            name,
            balance: Mutex::new(balance),
            price: dec!(50000),
            health: Mutex::new(Ok(())),
            place_script: Mutex::new(VecDeque::new()),
            lookup_script: Mutex::new(VecDeque::new()),
            placed: Mutex::new(Vec::new()),
            place_delay: Mutex::new(Duration::ZERO),
            place_calls: AtomicUsize::new(0),
            read_calls: AtomicUsize::new(0),
            lookup_calls: AtomicUsize::new(0),
            health_checks: AtomicUsize::new(0),
        }
    }

    pub fn set_balance(&self, balance: BalanceSnapshot) {
        *self.balance.lock().unwrap() = balance;
    }

    pub fn set_health(&self, health: Result<(), GatewayError>) {
        *self.health.lock().unwrap() = health;
    }

    pub fn set_place_delay(&self, delay: Duration) {
        *self.place_delay.lock().unwrap() = delay;
    }

    pub fn script_place(&self, outcomes: impl IntoIterator<Item = PlaceOutcome>) {
        self.place_script.lock().unwrap().extend(outcomes);
    }

    pub fn script_lookup_failure(&self, error: GatewayError) {
        self.lookup_script.lock().unwrap().push_back(error);
    }

    pub fn placed(&self) -> Vec<ExchangeOrder> {
        self.placed.lock().unwrap().clone()
    }

    fn fill(&self, request: &OrderRequest, client_order_id: &ClientOrderId) -> ExchangeOrder {
        let now = Utc::now();
        let price = request.limit_price().unwrap_or(self.price);
        ExchangeOrder {
            order_id: ExchangeOrderId::new(format!("{}-{}", self.name, self.placed().len() + 1)),
            client_order_id: Some(client_order_id.clone()),
            market: request.market().clone(),
            side: request.side(),
            order_type: request.order_type(),
            status: OrderStatus::Filled,
            amount: request.amount(),
            price: request.limit_price(),
            filled_amount: request.amount(),
            average_price: Some(price),
            fee: Decimal::ZERO,
            fee_currency: request.market().quote().to_string(),
            reject_reason: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[async_trait]
impl ExchangePort for FakeExchange {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn ticker_price(&self, _market: &Market) -> Result<Decimal, GatewayError> {
        self.read_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.price)
    }

    async fn order_book(&self, market: &Market, _depth: usize) -> Result<OrderBook, GatewayError> {
        self.read_calls.fetch_add(1, Ordering::SeqCst);
        Ok(OrderBook {
            market: market.clone(),
            bids: Vec::new(),
            asks: Vec::new(),
        })
    }

    async fn balance(&self) -> Result<BalanceSnapshot, GatewayError> {
        self.read_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.balance.lock().unwrap().clone())
    }

    async fn place_order(
        &self,
        request: &OrderRequest,
        client_order_id: &ClientOrderId,
    ) -> Result<ExchangeOrder, GatewayError> {
        self.place_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.place_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let outcome = self
            .place_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(PlaceOutcome::Accept);
        match outcome {
            PlaceOutcome::Accept => {
                let order = self.fill(request, client_order_id);
                self.placed.lock().unwrap().push(order.clone());
                Ok(order)
            }
            PlaceOutcome::Fail(err) => Err(err),
            PlaceOutcome::LandThenFail(err) => {
                let order = self.fill(request, client_order_id);
                self.placed.lock().unwrap().push(order);
                Err(err)
            }
        }
    }

    async fn get_order(
        &self,
        _market: &Market,
        order_id: &ExchangeOrderId,
    ) -> Result<ExchangeOrder, GatewayError> {
        self.read_calls.fetch_add(1, Ordering::SeqCst);
        self.placed()
            .into_iter()
            .find(|o| &o.order_id == order_id)
            .ok_or_else(|| GatewayError::NotFound {
                what: order_id.to_string(),
            })
    }

    async fn find_order_by_client_id(
        &self,
        _market: &Market,
        client_order_id: &ClientOrderId,
    ) -> Result<Option<ExchangeOrder>, GatewayError> {
        self.lookup_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.lookup_script.lock().unwrap().pop_front() {
            return Err(err);
        }
        Ok(self
            .placed()
            .into_iter()
            .find(|o| o.client_order_id.as_ref() == Some(client_order_id)))
    }

    async fn cancel_order(
        &self,
        market: &Market,
        order_id: &ExchangeOrderId,
    ) -> Result<ExchangeOrder, GatewayError> {
        let mut order = self.get_order(market, order_id).await?;
        order.status = OrderStatus::Cancelled;
        Ok(order)
    }

    async fn open_orders(&self, _market: Option<&Market>) -> Result<Vec<ExchangeOrder>, GatewayError> {
        self.read_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .placed()
            .into_iter()
            .filter(|o| o.status == OrderStatus::Open)
            .collect())
    }

    async fn health_check(&self) -> Result<(), GatewayError> {
        self.health_checks.fetch_add(1, Ordering::SeqCst);
        self.health.lock().unwrap().clone()
    }
}

/// Connector that always hands out the same fake.
pub struct FakeConnector {
    exchange: Arc<FakeExchange>,
    pub connects: AtomicUsize,
}

impl FakeConnector {
    pub const fn new(exchange: Arc<FakeExchange>) -> Self {
        Self {
            exchange,
            connects: AtomicUsize::new(0),
        }
    }
}

impl RealExchangeConnector for FakeConnector {
    fn connect(&self, _credentials: Arc<CredentialSet>) -> Result<Arc<dyn ExchangePort>, GatewayError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::clone(&self.exchange) as Arc<dyn ExchangePort>)
    }
}
