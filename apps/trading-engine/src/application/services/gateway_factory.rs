//! Exchange gateway resolution.
//!
//! Every order resolves its gateway from the mode snapshot it captured.
//! Nothing is cached across mode changes except the real exchange client
//! itself, which is pooled per credential set.

use std::sync::{Arc, Mutex, PoisonError};

use crate::application::ports::{
    CredentialProvider, CredentialSet, ExchangePort, RealExchangeConnector,
};
use crate::domain::order_execution::{ExchangeOrder, OrderRequest, OrderResult, Venue};
use crate::domain::shared::ClientOrderId;
use crate::domain::trading_mode::{ModeSnapshot, TradingMode};
use crate::error::ExecutionError;

/// The backend an execution runs against.
#[derive(Clone)]
pub enum ExchangeGateway {
    /// In-process simulated exchange.
    Simulated(Arc<dyn ExchangePort>),
    /// Real exchange client bound to validated credentials.
    Real(Arc<dyn ExchangePort>),
}

impl ExchangeGateway {
    /// The underlying port.
    #[must_use]
    pub fn port(&self) -> &dyn ExchangePort {
        match self {
            Self::Simulated(port) | Self::Real(port) => port.as_ref(),
        }
    }

    /// Which kind of backend this is.
    #[must_use]
    pub const fn venue(&self) -> Venue {
        match self {
            Self::Simulated(_) => Venue::Simulated,
            Self::Real(_) => Venue::Exchange,
        }
    }
}

impl std::fmt::Debug for ExchangeGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Simulated(port) => write!(f, "Simulated({})", port.name()),
            Self::Real(port) => write!(f, "Real({})", port.name()),
        }
    }
}

/// A mode snapshot paired with the gateway resolved for it.
///
/// Captured once per execution and threaded through the whole call.
#[derive(Debug, Clone)]
pub struct ResolvedGateway {
    snapshot: ModeSnapshot,
    gateway: ExchangeGateway,
    credentials_validated: bool,
}

impl ResolvedGateway {
    /// The captured mode snapshot.
    #[must_use]
    pub const fn snapshot(&self) -> &ModeSnapshot {
        &self.snapshot
    }

    /// Mode captured for this execution.
    #[must_use]
    pub const fn mode(&self) -> TradingMode {
        self.snapshot.current_mode
    }

    /// The resolved gateway.
    #[must_use]
    pub const fn gateway(&self) -> &ExchangeGateway {
        &self.gateway
    }

    /// Shorthand for `gateway().port()`.
    #[must_use]
    pub fn port(&self) -> &dyn ExchangePort {
        self.gateway.port()
    }

    /// Whether credentials were validated while resolving this gateway.
    #[must_use]
    pub const fn credentials_validated(&self) -> bool {
        self.credentials_validated
    }

    /// Turn a gateway report into a result stamped with the captured mode.
    pub(crate) fn stamp(
        &self,
        report: ExchangeOrder,
        client_order_id: ClientOrderId,
        request: &OrderRequest,
    ) -> OrderResult {
        OrderResult::stamp(
            report,
            client_order_id,
            self.snapshot.current_mode,
            self.snapshot.dry_run_enabled,
            self.gateway.venue(),
            request,
        )
    }
}

struct PooledConnection {
    credentials: Arc<CredentialSet>,
    port: Arc<dyn ExchangePort>,
}

/// Resolves the gateway for a mode snapshot.
pub struct ExchangeGatewayFactory {
    dry_run: Arc<dyn ExchangePort>,
    demo: Arc<dyn ExchangePort>,
    credentials: Arc<dyn CredentialProvider>,
    connector: Arc<dyn RealExchangeConnector>,
    pool: Mutex<Option<PooledConnection>>,
}

impl ExchangeGatewayFactory {
    /// Create a factory. The dry-run and demo simulators keep separate balances.
    pub fn new(
        dry_run: Arc<dyn ExchangePort>,
        demo: Arc<dyn ExchangePort>,
        credentials: Arc<dyn CredentialProvider>,
        connector: Arc<dyn RealExchangeConnector>,
    ) -> Self {
        Self {
            dry_run,
            demo,
            credentials,
            connector,
            pool: Mutex::new(None),
        }
    }

    /// Resolve the gateway for `snapshot`.
    ///
    /// Simulated modes (including live with the dry-run lock engaged) never
    /// touch credentials or the network. Live trading re-validates
    /// credentials and probes the exchange on every call; any failure is a
    /// `GATEWAY_UNAVAILABLE` error and never falls back to simulation.
    pub async fn resolve(&self, snapshot: ModeSnapshot) -> Result<ResolvedGateway, ExecutionError> {
        if snapshot.routes_to_simulation() {
            let port = match snapshot.current_mode {
                TradingMode::Demo => Arc::clone(&self.demo),
                TradingMode::DryRun | TradingMode::Live => Arc::clone(&self.dry_run),
            };
            return Ok(ResolvedGateway {
                snapshot,
                gateway: ExchangeGateway::Simulated(port),
                credentials_validated: false,
            });
        }

        let credentials = self.credentials.validate().await.map_err(|e| {
            tracing::error!(error = %e, "Live gateway resolution failed, credentials invalid");
            ExecutionError::gateway_unavailable(format!("live gateway unavailable: {e}"))
        })?;

        let port = self.connection_for(credentials)?;
        if let Err(e) = port.health_check().await {
            tracing::error!(error = %e, exchange = port.name(), "Live gateway health check failed");
            return Err(ExecutionError::gateway_unavailable(format!(
                "live gateway unavailable: {e}"
            )));
        }

        tracing::warn!(exchange = port.name(), "Resolved REAL exchange gateway");
        Ok(ResolvedGateway {
            snapshot,
            gateway: ExchangeGateway::Real(port),
            credentials_validated: true,
        })
    }

    fn connection_for(
        &self,
        credentials: Arc<CredentialSet>,
    ) -> Result<Arc<dyn ExchangePort>, ExecutionError> {
        let mut pool = self.pool.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(pooled) = pool.as_ref()
            && *pooled.credentials == *credentials
        {
            return Ok(Arc::clone(&pooled.port));
        }

        let port = self
            .connector
            .connect(Arc::clone(&credentials))
            .map_err(|e| ExecutionError::gateway_unavailable(format!("live gateway unavailable: {e}")))?;
        tracing::info!(exchange = port.name(), "Connected real exchange client");
        *pool = Some(PooledConnection {
            credentials,
            port: Arc::clone(&port),
        });
        Ok(port)
    }
}
