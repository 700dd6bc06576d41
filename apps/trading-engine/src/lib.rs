// Allow unwrap/expect in tests - tests should panic on unexpected errors
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::match_same_arms,
        clippy::needless_pass_by_value,
        clippy::needless_collect,
        clippy::option_if_let_else,
        clippy::default_trait_access,
        clippy::items_after_statements,
        clippy::or_fun_call
    )
)]

//! Trading Engine - Mode-Gated Order Execution
//!
//! Executes crypto orders against exactly one of three backends, chosen by
//! a process-wide trading mode:
//!
//! | Mode | Dry-run lock | Gateway |
//! |------|--------------|---------|
//! | `dry_run` | forced on | simulator (no slippage) |
//! | `demo` | forced on | simulator (randomised slippage) |
//! | `live` | on | simulator, a live rehearsal |
//! | `live` | off | Bitvavo REST API |
//!
//! Entering live requires freshly validated credentials. The emergency
//! dry-run switch always succeeds and never waits for in-flight work. Each
//! execution reads the mode once, and its result carries that mode.
//!
//! # Architecture (Clean Architecture + Hexagonal)
//!
//! ## Layers (inside → outside)
//!
//! - **Domain**: pure types and rules
//!   - `trading_mode`: modes, snapshots, the epoch-guarded mode state
//!   - `order_execution`: requests, exchange reports, stamped results
//!   - `safety`: shape, balance and per-mode risk validation
//!
//! - **Application**: ports and orchestration
//!   - `ports`: `ExchangePort`, `CredentialProvider`, `OrderJournal`
//!   - `services`: `TradingModeController`, `ExchangeGatewayFactory`
//!   - `use_cases`: `OrderExecutionService`
//!
//! - **Infrastructure**: adapters
//!   - `exchange`: simulator and Bitvavo adapter
//!   - `http`: axum REST API
//!   - `config`: dependency injection container

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Clean Architecture Layers
// =============================================================================

/// Domain layer - Core business logic with no external dependencies.
pub mod domain;

/// Application layer - Use cases and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Cross-cutting
// =============================================================================

/// YAML configuration with environment interpolation.
pub mod config;

/// Error taxonomy and HTTP mapping.
pub mod error;

/// Logging and metrics.
pub mod observability;

// =============================================================================
// Re-exports
// =============================================================================

pub use application::services::{ExchangeGatewayFactory, TradingModeController};
pub use application::use_cases::OrderExecutionService;
pub use domain::order_execution::{
    OrderRequest, OrderResult, OrderSide, OrderStatus, OrderType, Venue,
};
pub use domain::trading_mode::{ModeSnapshot, TradingMode};
pub use error::{ErrorCode, ExecutionError};
