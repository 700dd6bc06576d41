//! Execute Order Use Case
//!
//! Orchestrates one order from request to mode-stamped result:
//!
//! 1. Shape validation (pure). A rejection touches no gateway.
//! 2. Capture the mode snapshot, once.
//! 3. Resolve the gateway for that snapshot. A key whose earlier attempt
//!    ended without a result is looked up there first and adopted if found.
//! 4. Read balance, open orders and a price estimate from that gateway
//!    (idempotent reads, retried with backoff).
//! 5. Balance and risk validation. A rejection places nothing.
//! 6. Place the order under an idempotency key. Failures that may have
//!    reached the exchange are resolved by looking the key up before any
//!    retry; if the lookup itself fails the error is surfaced as ambiguous.
//! 7. Stamp the result with the captured mode and journal it.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::application::ports::{
    ExchangePort, GatewayError, JournalEntry, JournalOutcome, OrderJournal,
};
use crate::application::retry::RetryPolicy;
use crate::application::services::{ExchangeGatewayFactory, ResolvedGateway, TradingModeController};
use crate::domain::order_execution::{
    BalanceSnapshot, ExchangeOrder, OrderRequest, OrderResult, OrderType, Venue,
};
use crate::domain::safety::{SafetyValidator, ValidationContext};
use crate::domain::shared::{ClientOrderId, ExchangeOrderId, Market};
use crate::domain::trading_mode::TradingMode;
use crate::error::ExecutionError;
use crate::observability;

/// Data read from whichever gateway the current mode resolves to, tagged
/// with that mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayView<T> {
    /// Mode the read was resolved under.
    pub mode: TradingMode,
    /// Whether the dry-run lock was engaged.
    pub dry_run: bool,
    /// Backend that served the read.
    pub venue: Venue,
    /// The data.
    pub data: T,
}

impl<T> GatewayView<T> {
    fn new(resolved: &ResolvedGateway, data: T) -> Self {
        Self {
            mode: resolved.mode(),
            dry_run: resolved.snapshot().dry_run_enabled,
            venue: resolved.gateway().venue(),
            data,
        }
    }
}

/// What the journal says about an idempotency key.
enum PriorAttempt {
    New,
    Executed(Box<OrderResult>),
    /// An attempt was journaled without a result; it may still have landed.
    Unresolved {
        exchange_order_id: Option<ExchangeOrderId>,
    },
}

fn ambiguous(
    client_order_id: &ClientOrderId,
    exchange_order_id: Option<&ExchangeOrderId>,
    message: String,
) -> ExecutionError {
    tracing::error!(
        %client_order_id,
        exchange_order_id = exchange_order_id.map(ExchangeOrderId::as_str),
        %message,
        "Order outcome unknown, manual reconciliation required"
    );
    ExecutionError::execution_ambiguous(
        message,
        client_order_id.as_str(),
        exchange_order_id.map(ExchangeOrderId::as_str),
    )
}

/// Order execution use case.
pub struct OrderExecutionService {
    modes: Arc<TradingModeController>,
    gateways: Arc<ExchangeGatewayFactory>,
    validator: SafetyValidator,
    journal: Arc<dyn OrderJournal>,
    retry: RetryPolicy,
}

impl OrderExecutionService {
    /// Create the service.
    pub fn new(
        modes: Arc<TradingModeController>,
        gateways: Arc<ExchangeGatewayFactory>,
        validator: SafetyValidator,
        journal: Arc<dyn OrderJournal>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            modes,
            gateways,
            validator,
            journal,
            retry,
        }
    }

    /// The mode controller this service reads from.
    #[must_use]
    pub const fn modes(&self) -> &Arc<TradingModeController> {
        &self.modes
    }

    /// Execute an order under a freshly generated idempotency key.
    pub async fn execute(&self, request: OrderRequest) -> Result<OrderResult, ExecutionError> {
        self.execute_with_key(request, ClientOrderId::generate())
            .await
    }

    /// Execute an order under a caller-supplied idempotency key.
    ///
    /// Re-submitting a key that already produced a result returns that
    /// result instead of placing a second order.
    pub async fn execute_with_key(
        &self,
        request: OrderRequest,
        client_order_id: ClientOrderId,
    ) -> Result<OrderResult, ExecutionError> {
        if let Err(violation) = self.validator.validate_shape(&request) {
            return Err(self.reject(self.modes.status().current_mode, violation.into()));
        }

        let prior = match self.prior_attempt(&client_order_id).await {
            PriorAttempt::Executed(previous) => {
                tracing::info!(
                    client_order_id = %client_order_id,
                    order_id = %previous.order_id,
                    "Duplicate idempotency key, returning recorded result"
                );
                return Ok(*previous);
            }
            prior => prior,
        };

        // The only read of the global mode for this execution.
        let snapshot = self.modes.status();
        let mode = snapshot.current_mode;
        let started = Instant::now();

        let resolved = match self.gateways.resolve(snapshot).await {
            Ok(resolved) => resolved,
            Err(err) => return Err(self.fail(&request, &client_order_id, mode, err).await),
        };

        if let PriorAttempt::Unresolved { exchange_order_id } = prior {
            match self
                .reconcile(&resolved, &request, &client_order_id, exchange_order_id)
                .await
            {
                Ok(Some(report)) => {
                    let result = resolved.stamp(report, client_order_id, &request);
                    self.record_success(&result, started.elapsed()).await;
                    return Ok(result);
                }
                Ok(None) => {}
                Err(err) => return Err(self.fail(&request, &client_order_id, mode, err).await),
            }
        }

        let balance = match self.read_balance(&resolved).await {
            Ok(balance) => balance,
            Err(err) => return Err(self.fail(&request, &client_order_id, mode, err).await),
        };
        let (open_orders, price_estimate) = match self.read_market_context(&resolved, &request).await
        {
            Ok(context) => context,
            Err(err) => return Err(self.fail(&request, &client_order_id, mode, err).await),
        };

        let context = ValidationContext {
            balance: &balance,
            open_orders,
            price_estimate,
        };
        if let Err(violation) = self
            .validator
            .validate_balance(&request, &context)
            .and_then(|()| self.validator.validate_risk(&request, mode, &context))
        {
            return Err(self.reject(mode, violation.into()));
        }

        match self.place(&resolved, &request, &client_order_id).await {
            Ok(report) => {
                let result = resolved.stamp(report, client_order_id, &request);
                self.record_success(&result, started.elapsed()).await;
                Ok(result)
            }
            Err(err) => Err(self.fail(&request, &client_order_id, mode, err).await),
        }
    }

    /// Balances of the gateway the current mode resolves to.
    pub async fn balance(&self) -> Result<GatewayView<BalanceSnapshot>, ExecutionError> {
        let resolved = self.gateways.resolve(self.modes.status()).await?;
        let balance = self.read_balance(&resolved).await?;
        Ok(GatewayView::new(&resolved, balance))
    }

    /// Open orders on the gateway the current mode resolves to.
    pub async fn open_orders(
        &self,
        market: Option<&Market>,
    ) -> Result<GatewayView<Vec<ExchangeOrder>>, ExecutionError> {
        let resolved = self.gateways.resolve(self.modes.status()).await?;
        let port = resolved.port();
        let orders = self
            .retry
            .run("open_orders", move || port.open_orders(market))
            .await?;
        Ok(GatewayView::new(&resolved, orders))
    }

    /// Cancel an order on the gateway the current mode resolves to.
    pub async fn cancel_order(
        &self,
        market: &Market,
        order_id: &ExchangeOrderId,
    ) -> Result<GatewayView<ExchangeOrder>, ExecutionError> {
        let resolved = self.gateways.resolve(self.modes.status()).await?;
        let port = resolved.port();
        if matches!(resolved.gateway().venue(), Venue::Exchange) {
            tracing::warn!(%market, %order_id, "Cancelling REAL order on exchange");
        }
        let order = self
            .retry
            .run("cancel_order", move || port.cancel_order(market, order_id))
            .await?;
        tracing::info!(%market, %order_id, status = %order.status, "Order cancelled");
        Ok(GatewayView::new(&resolved, order))
    }

    /// Most recent journal entries, newest first.
    pub async fn journal(&self, limit: usize) -> Result<Vec<JournalEntry>, ExecutionError> {
        self.journal
            .recent(limit)
            .await
            .map_err(|e| ExecutionError::internal(e.to_string()))
    }

    async fn read_balance(&self, resolved: &ResolvedGateway) -> Result<BalanceSnapshot, ExecutionError> {
        let port = resolved.port();
        Ok(self.retry.run("balance", move || port.balance()).await?)
    }

    async fn read_market_context(
        &self,
        resolved: &ResolvedGateway,
        request: &OrderRequest,
    ) -> Result<(usize, Decimal), ExecutionError> {
        let port = resolved.port();
        let open_orders = self
            .retry
            .run("open_orders", move || port.open_orders(None))
            .await?
            .len();

        let price_estimate = match (request.order_type(), request.limit_price()) {
            (OrderType::Limit, Some(price)) => price,
            _ => {
                let market = request.market();
                self.retry
                    .run("ticker_price", move || port.ticker_price(market))
                    .await?
            }
        };

        Ok((open_orders, price_estimate))
    }

    /// Place without ever blindly repeating a request that may have landed.
    async fn place(
        &self,
        resolved: &ResolvedGateway,
        request: &OrderRequest,
        client_order_id: &ClientOrderId,
    ) -> Result<ExchangeOrder, ExecutionError> {
        let port = resolved.port();
        let mut backoff = self.retry.backoff();

        loop {
            if matches!(resolved.gateway().venue(), Venue::Exchange) {
                tracing::warn!(
                    %client_order_id,
                    market = %request.market(),
                    side = %request.side(),
                    amount = %request.amount(),
                    attempt = backoff.attempt(),
                    "Placing REAL order on exchange"
                );
            }

            let err = match port.place_order(request, client_order_id).await {
                Ok(order) => return Ok(order),
                Err(err) => err,
            };

            if err.may_have_executed() {
                let known_id = err.exchange_order_id().cloned();
                match self.lookup(port, request.market(), client_order_id).await {
                    Ok(Some(order)) => {
                        tracing::info!(
                            %client_order_id,
                            order_id = %order.order_id,
                            "Order found by idempotency key after ambiguous failure"
                        );
                        return Ok(order);
                    }
                    Ok(None) if known_id.is_none() => {
                        tracing::warn!(
                            %client_order_id,
                            error = %err,
                            "Ambiguous failure, exchange confirms order absent"
                        );
                    }
                    Ok(None) => {
                        return Err(ambiguous(
                            client_order_id,
                            known_id.as_ref(),
                            format!("order was assigned an id but {err}; exchange reports no order for the key"),
                        ));
                    }
                    Err(lookup_err) => {
                        let known_id = known_id.or_else(|| lookup_err.exchange_order_id().cloned());
                        return Err(ambiguous(
                            client_order_id,
                            known_id.as_ref(),
                            format!(
                                "order may have been placed ({err}); status lookup failed ({lookup_err})"
                            ),
                        ));
                    }
                }
            } else if !err.is_retryable() {
                return Err(err.into());
            }

            let Some(delay) = backoff.next_backoff() else {
                return Err(ExecutionError::gateway_unavailable(format!(
                    "order not placed after {} attempts: {err}",
                    backoff.attempt()
                ))
                .with_context("client_order_id", client_order_id.as_str()));
            };
            tracing::warn!(
                %client_order_id,
                error = %err,
                delay_ms = delay.as_millis() as u64,
                "Order not placed, retrying"
            );
            observability::record_gateway_retry("place_order");
            tokio::time::sleep(delay).await;
        }
    }

    async fn lookup(
        &self,
        port: &dyn ExchangePort,
        market: &Market,
        client_order_id: &ClientOrderId,
    ) -> Result<Option<ExchangeOrder>, GatewayError> {
        self.retry
            .run("find_order_by_client_id", move || {
                port.find_order_by_client_id(market, client_order_id)
            })
            .await
    }

    /// Settle a key whose earlier attempt ended without a result. Only a
    /// confirmed absence lets the caller place again.
    async fn reconcile(
        &self,
        resolved: &ResolvedGateway,
        request: &OrderRequest,
        client_order_id: &ClientOrderId,
        exchange_order_id: Option<ExchangeOrderId>,
    ) -> Result<Option<ExchangeOrder>, ExecutionError> {
        match self
            .lookup(resolved.port(), request.market(), client_order_id)
            .await
        {
            Ok(Some(order)) => {
                tracing::info!(
                    %client_order_id,
                    order_id = %order.order_id,
                    "Earlier attempt found by idempotency key, adopting it"
                );
                Ok(Some(order))
            }
            Ok(None) => {
                tracing::info!(%client_order_id, "Earlier attempt confirmed absent, placing");
                Ok(None)
            }
            Err(lookup_err) => Err(ambiguous(
                client_order_id,
                exchange_order_id.as_ref(),
                format!("earlier attempt unresolved; status lookup failed ({lookup_err})"),
            )),
        }
    }

    async fn prior_attempt(&self, client_order_id: &ClientOrderId) -> PriorAttempt {
        match self.journal.find_by_client_id(client_order_id).await {
            Ok(Some(JournalEntry {
                outcome: JournalOutcome::Executed { result },
                ..
            })) => PriorAttempt::Executed(result),
            Ok(Some(JournalEntry {
                outcome: JournalOutcome::Failed {
                    exchange_order_id, ..
                },
                ..
            })) => PriorAttempt::Unresolved {
                exchange_order_id: exchange_order_id.map(ExchangeOrderId::new),
            },
            Ok(None) => PriorAttempt::New,
            Err(e) => {
                // Without the journal we cannot tell; check the exchange.
                tracing::warn!(error = %e, "Journal lookup failed, reconciling key with exchange");
                PriorAttempt::Unresolved {
                    exchange_order_id: None,
                }
            }
        }
    }

    fn reject(&self, mode: TradingMode, error: ExecutionError) -> ExecutionError {
        tracing::info!(%mode, code = %error.code(), message = error.message(), "Order rejected");
        observability::record_order_rejection(mode, error.code().reason());
        error
    }

    async fn record_success(&self, result: &OrderResult, elapsed: Duration) {
        if result.is_live_execution() {
            tracing::warn!(
                order_id = %result.order_id,
                status = %result.status,
                filled = %result.filled_amount,
                "REAL order executed"
            );
        } else {
            tracing::info!(
                order_id = %result.order_id,
                mode = %result.executing_mode,
                status = %result.status,
                "Order executed"
            );
        }
        observability::record_order_executed(
            result.executing_mode,
            result.status.as_str(),
            elapsed.as_secs_f64(),
        );

        let entry = JournalEntry {
            client_order_id: result.client_order_id.clone(),
            mode: result.executing_mode,
            market: result.market.clone(),
            side: result.side,
            outcome: JournalOutcome::Executed {
                result: Box::new(result.clone()),
            },
            recorded_at: Utc::now(),
        };
        if let Err(e) = self.journal.record(entry).await {
            tracing::error!(error = %e, order_id = %result.order_id, "Failed to journal executed order");
        }
    }

    async fn fail(
        &self,
        request: &OrderRequest,
        client_order_id: &ClientOrderId,
        mode: TradingMode,
        error: ExecutionError,
    ) -> ExecutionError {
        tracing::error!(%client_order_id, %mode, error = %error, "Order execution failed");
        observability::record_order_rejection(mode, error.code().reason());
        let entry = JournalEntry {
            client_order_id: client_order_id.clone(),
            mode,
            market: request.market().clone(),
            side: request.side(),
            outcome: JournalOutcome::failed(&error),
            recorded_at: Utc::now(),
        };
        if let Err(e) = self.journal.record(entry).await {
            tracing::error!(error = %e, "Failed to journal execution failure");
        }
        error
    }
}
