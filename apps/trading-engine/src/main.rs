//! Trading Engine Binary
//!
//! Starts the HTTP API in dry-run (or demo) mode.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin trading-engine
//! ```
//!
//! # Environment Variables
//!
//! - `TRADING_ENGINE_CONFIG`: configuration file (default: `config.yaml`)
//! - `BITVAVO_API_KEY`, `BITVAVO_API_SECRET`: live trading credentials
//! - `RUST_LOG`: log filter, overrides `observability.logging.level`

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::broadcast;

use trading_engine::config::{Config, load_config};
use trading_engine::infrastructure::config::Container;
use trading_engine::infrastructure::http::create_router;
use trading_engine::observability::{init_metrics, init_tracing};

/// Graceful shutdown timeout.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();

    let config = load_config(None).context("failed to load configuration")?;
    init_tracing(&config.observability.logging);

    tracing::info!("Starting Trading Engine");
    log_config(&config);

    init_metrics(&config.observability.metrics).context("failed to start metrics exporter")?;

    let container = Container::from_config(&config);
    let app = create_router(container.app_state(env!("CARGO_PKG_VERSION")));

    let addr: SocketAddr = config
        .server
        .listen_addr()
        .parse()
        .context("invalid server address")?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(%addr, "HTTP server starting");
    tracing::info!("Endpoints:");
    tracing::info!("  GET    /health");
    tracing::info!("  GET    /api/v1/trading-mode/status");
    tracing::info!("  POST   /api/v1/trading-mode/set");
    tracing::info!("  POST   /api/v1/trading-mode/enable-dry-run");
    tracing::info!("  GET    /api/v1/trading-mode/validate-live");
    tracing::info!("  POST   /api/v1/trading/order");
    tracing::info!("  DELETE /api/v1/trading/order/{{market}}/{{order_id}}");
    tracing::info!("  GET    /api/v1/trading/balance");
    tracing::info!("  GET    /api/v1/trading/open-orders");
    tracing::info!("  GET    /api/v1/trading/orders");

    let (shutdown_tx, mut shutdown_rx) = broadcast::channel::<()>(1);
    let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal(shutdown_tx));
    let mut handle = tokio::spawn(async move {
        if let Err(e) = server.await {
            tracing::error!("HTTP server error: {e}");
        }
    });

    tracing::info!("Trading engine ready");

    tokio::select! {
        _ = &mut handle => {
            tracing::info!("HTTP server stopped");
        }
        _ = shutdown_rx.recv() => {
            if tokio::time::timeout(SHUTDOWN_TIMEOUT, handle).await.is_err() {
                tracing::warn!(
                    timeout_secs = SHUTDOWN_TIMEOUT.as_secs(),
                    "Shutdown timed out with requests still in flight"
                );
            }
        }
    }

    tracing::info!("Trading engine stopped");
    Ok(())
}

/// Load .env file from current or ancestor directories.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        for dir in cwd.ancestors().skip(1) {
            let env_path = dir.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
        }
    }
}

/// Log the loaded configuration. Credentials are reported as present or not.
fn log_config(config: &Config) {
    tracing::info!(
        initial_mode = %config.trading.initial_mode,
        listen_addr = %config.server.listen_addr(),
        exchange = %config.exchange.base_url,
        live_credentials_configured = config.exchange.credentials().is_some(),
        verify_credentials = config.exchange.verify_credentials,
        metrics_enabled = config.observability.metrics.enabled,
        "Configuration loaded"
    );
}

/// Wait for shutdown signal (SIGTERM or SIGINT).
///
/// # Panics
///
/// Panics if signal handlers cannot be installed; a process that cannot
/// receive termination signals should not start.
#[allow(clippy::expect_used)]
async fn shutdown_signal(shutdown_tx: broadcast::Sender<()>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("signal handler installation is critical for graceful shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler installation is critical for graceful shutdown")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }

    let _ = shutdown_tx.send(());
}
