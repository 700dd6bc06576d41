//! Application services shared by every use case.

mod gateway_factory;
mod trading_mode_controller;

pub use gateway_factory::{ExchangeGateway, ExchangeGatewayFactory, ResolvedGateway};
pub use trading_mode_controller::{LiveReadiness, ModeError, TradingModeController};
