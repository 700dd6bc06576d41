//! Dependency Injection Container
//!
//! Builds the trading engine's object graph from a [`Config`].

use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::{CredentialProvider, ExchangePort, RealExchangeConnector};
use crate::application::services::{ExchangeGatewayFactory, TradingModeController};
use crate::application::use_cases::OrderExecutionService;
use crate::config::Config;
use crate::domain::safety::SafetyValidator;
use crate::infrastructure::credentials::{ExchangeCredentialProvider, StaticCredentialProvider};
use crate::infrastructure::exchange::{
    BitvavoConfig, BitvavoConnector, SimulatedExchange, SimulatorSettings,
};
use crate::infrastructure::http::AppState;
use crate::infrastructure::persistence::InMemoryOrderJournal;

/// Wired application components.
pub struct Container {
    modes: Arc<TradingModeController>,
    orders: Arc<OrderExecutionService>,
}

impl Container {
    /// Wire the engine against the Bitvavo REST API.
    ///
    /// Credentials are checked with an authenticated round-trip unless
    /// `exchange.verify_credentials` is off.
    pub fn from_config(config: &Config) -> Self {
        let exchange = &config.exchange;
        let connector = BitvavoConnector::new(
            BitvavoConfig {
                access_window_ms: exchange.access_window_ms,
                ..BitvavoConfig::default()
            }
            .with_base_url(exchange.base_url.as_str())
            .with_timeout(Duration::from_secs(exchange.timeout_secs)),
        );

        let credentials: Arc<dyn CredentialProvider> = if exchange.verify_credentials {
            Arc::new(ExchangeCredentialProvider::new(
                exchange.credentials(),
                connector.clone(),
            ))
        } else {
            Arc::new(StaticCredentialProvider::new(exchange.credentials()))
        };

        Self::with_real_exchange(config, credentials, Arc::new(connector))
    }

    /// Wire the engine with a caller-supplied live gateway.
    pub fn with_real_exchange(
        config: &Config,
        credentials: Arc<dyn CredentialProvider>,
        connector: Arc<dyn RealExchangeConnector>,
    ) -> Self {
        let modes = Arc::new(TradingModeController::new(
            config.trading.initial_mode,
            Arc::clone(&credentials),
        ));

        let gateways = Arc::new(ExchangeGatewayFactory::new(
            simulator("dry_run", config, 0),
            simulator("demo", config, config.simulation.demo_max_slippage_bps),
            credentials,
            connector,
        ));

        let validator = SafetyValidator::new(
            config.risk.minimum_order_sizes.clone(),
            config.risk.mode_limits(),
        );

        let orders = Arc::new(OrderExecutionService::new(
            Arc::clone(&modes),
            gateways,
            validator,
            Arc::new(InMemoryOrderJournal::with_capacity(
                config.trading.journal_capacity,
            )),
            config.retry.policy(),
        ));

        tracing::info!(
            initial_mode = %config.trading.initial_mode,
            live_credentials_configured = config.exchange.credentials().is_some(),
            "Trading engine wired"
        );

        Self { modes, orders }
    }

    /// The trading mode controller.
    pub fn modes(&self) -> Arc<TradingModeController> {
        Arc::clone(&self.modes)
    }

    /// The order execution service.
    pub fn orders(&self) -> Arc<OrderExecutionService> {
        Arc::clone(&self.orders)
    }

    /// HTTP state for [`crate::infrastructure::http::create_router`].
    pub fn app_state(&self, version: impl Into<String>) -> AppState {
        AppState {
            modes: self.modes(),
            orders: self.orders(),
            version: version.into(),
        }
    }
}

/// Simulators keep as many finished orders as the journal keeps entries,
/// so a journaled key can always be looked up.
fn simulator(name: &'static str, config: &Config, max_slippage_bps: u32) -> Arc<dyn ExchangePort> {
    let simulation = &config.simulation;
    Arc::new(SimulatedExchange::new(
        name,
        SimulatorSettings {
            initial_balances: simulation.starting_balances.clone(),
            reference_prices: simulation.reference_prices.clone(),
            fee_rate: simulation.fee_rate,
            max_slippage_bps,
            order_retention: config.trading.journal_capacity,
        },
    ))
}
