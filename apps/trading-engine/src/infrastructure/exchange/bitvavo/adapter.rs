//! Bitvavo exchange adapter implementing `ExchangePort`.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;

use super::api_types::{
    self, BalanceEntry, BookResponse, CancelResponse, NewOrderBody, OrderResponse, ServerTime,
    TickerPrice,
};
use super::config::BitvavoConfig;
use super::error::BitvavoError;
use super::http_client::BitvavoHttpClient;
use crate::application::ports::{
    CredentialSet, ExchangePort, GatewayError, RealExchangeConnector,
};
use crate::domain::order_execution::{
    BalanceSnapshot, ExchangeOrder, OrderBook, OrderRequest, OrderStatus,
};
use crate::domain::shared::{ClientOrderId, ExchangeOrderId, Market};

/// Real exchange gateway backed by the Bitvavo REST API.
#[derive(Debug, Clone)]
pub struct BitvavoExchange {
    client: BitvavoHttpClient,
}

impl BitvavoExchange {
    /// Create an adapter for one credential set.
    pub fn new(config: &BitvavoConfig, credentials: Arc<CredentialSet>) -> Result<Self, BitvavoError> {
        Ok(Self {
            client: BitvavoHttpClient::new(config, credentials)?,
        })
    }

    /// Exchange server time in epoch milliseconds.
    pub async fn server_time(&self) -> Result<i64, GatewayError> {
        let time: ServerTime = self.client.get("/time").await?;
        Ok(time.time)
    }

    fn order_body(request: &OrderRequest, client_order_id: &ClientOrderId) -> NewOrderBody {
        NewOrderBody {
            market: request.market().to_string(),
            side: request.side().as_str(),
            order_type: request.order_type().as_str(),
            amount: request.amount().normalize().to_string(),
            price: request.limit_price().map(|p| p.normalize().to_string()),
            client_order_id: client_order_id.to_string(),
        }
    }

    fn rejected(
        request: &OrderRequest,
        client_order_id: &ClientOrderId,
        reason: String,
    ) -> ExchangeOrder {
        let now = Utc::now();
        ExchangeOrder {
            order_id: ExchangeOrderId::new(format!("rejected-{client_order_id}")),
            client_order_id: Some(client_order_id.clone()),
            market: request.market().clone(),
            side: request.side(),
            order_type: request.order_type(),
            status: OrderStatus::Rejected,
            amount: request.amount(),
            price: request.limit_price(),
            filled_amount: Decimal::ZERO,
            average_price: None,
            fee: Decimal::ZERO,
            fee_currency: request.market().quote().to_string(),
            reject_reason: Some(reason),
            created_at: now,
            updated_at: now,
        }
    }
}

fn report(response: OrderResponse) -> Result<ExchangeOrder, GatewayError> {
    let order_id = (!response.order_id.is_empty())
        .then(|| ExchangeOrderId::new(response.order_id.clone()));
    response
        .into_report()
        .map_err(|message| GatewayError::Protocol { message, order_id })
}

#[async_trait]
impl ExchangePort for BitvavoExchange {
    fn name(&self) -> &'static str {
        "bitvavo"
    }

    async fn ticker_price(&self, market: &Market) -> Result<Decimal, GatewayError> {
        let ticker: TickerPrice = self
            .client
            .get(&format!("/ticker/price?market={market}"))
            .await?;
        Ok(ticker.price)
    }

    async fn order_book(&self, market: &Market, depth: usize) -> Result<OrderBook, GatewayError> {
        let book: BookResponse = self
            .client
            .get(&format!("/{market}/book?depth={depth}"))
            .await?;
        Ok(api_types::order_book(market, book, depth))
    }

    async fn balance(&self) -> Result<BalanceSnapshot, GatewayError> {
        let entries: Vec<BalanceEntry> = self.client.get("/balance").await?;
        Ok(api_types::balance_snapshot(entries))
    }

    async fn place_order(
        &self,
        request: &OrderRequest,
        client_order_id: &ClientOrderId,
    ) -> Result<ExchangeOrder, GatewayError> {
        let body = Self::order_body(request, client_order_id);
        match self.client.post::<OrderResponse, _>("/order", &body).await {
            Ok(response) => report(response),
            Err(BitvavoError::Api { code, message }) => {
                tracing::warn!(
                    %client_order_id,
                    code,
                    reason = %message,
                    "Bitvavo rejected order"
                );
                Ok(Self::rejected(request, client_order_id, message))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn get_order(
        &self,
        market: &Market,
        order_id: &ExchangeOrderId,
    ) -> Result<ExchangeOrder, GatewayError> {
        let response: OrderResponse = self
            .client
            .get(&format!("/order?market={market}&orderId={order_id}"))
            .await?;
        report(response)
    }

    async fn find_order_by_client_id(
        &self,
        market: &Market,
        client_order_id: &ClientOrderId,
    ) -> Result<Option<ExchangeOrder>, GatewayError> {
        let lookup = self
            .client
            .get::<OrderResponse>(&format!(
                "/order?market={market}&clientOrderId={client_order_id}"
            ))
            .await;
        match lookup {
            Ok(response) => report(response).map(Some),
            Err(BitvavoError::NotFound(_)) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn cancel_order(
        &self,
        market: &Market,
        order_id: &ExchangeOrderId,
    ) -> Result<ExchangeOrder, GatewayError> {
        let cancelled: CancelResponse = self
            .client
            .delete(&format!("/order?market={market}&orderId={order_id}"))
            .await?;
        tracing::info!(order_id = %cancelled.order_id, "Bitvavo order cancelled");
        self.get_order(market, order_id).await
    }

    async fn open_orders(&self, market: Option<&Market>) -> Result<Vec<ExchangeOrder>, GatewayError> {
        let path = market.map_or_else(
            || "/ordersOpen".to_string(),
            |m| format!("/ordersOpen?market={m}"),
        );
        let responses: Vec<OrderResponse> = self.client.get(&path).await?;
        Ok(responses
            .into_iter()
            .filter_map(|response| {
                let order_id = response.order_id.clone();
                response
                    .into_report()
                    .inspect_err(|e| tracing::warn!(%order_id, error = %e, "Skipping open order"))
                    .ok()
            })
            .collect())
    }

    async fn health_check(&self) -> Result<(), GatewayError> {
        self.server_time().await.map(|_| ())
    }
}

/// Builds Bitvavo clients for the gateway factory.
#[derive(Debug, Clone, Default)]
pub struct BitvavoConnector {
    config: BitvavoConfig,
}

impl BitvavoConnector {
    /// Create a connector.
    #[must_use]
    pub const fn new(config: BitvavoConfig) -> Self {
        Self { config }
    }

    /// Adapter for one credential set, typed concretely.
    pub fn exchange(&self, credentials: Arc<CredentialSet>) -> Result<BitvavoExchange, GatewayError> {
        Ok(BitvavoExchange::new(&self.config, credentials)?)
    }
}

impl RealExchangeConnector for BitvavoConnector {
    fn connect(&self, credentials: Arc<CredentialSet>) -> Result<Arc<dyn ExchangePort>, GatewayError> {
        Ok(Arc::new(self.exchange(credentials)?))
    }
}
