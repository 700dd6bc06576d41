//! Risk limits and minimum order sizes.

use std::collections::HashMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::domain::shared::Market;
use crate::domain::trading_mode::TradingMode;

/// Per-mode risk parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskLimits {
    /// Largest notional (quote currency) a single order may have.
    pub max_trade_amount: Decimal,
    /// Largest number of orders that may be open at once, including the new one.
    pub max_open_orders: usize,
}

impl RiskLimits {
    /// Limits used for simulated modes.
    #[must_use]
    pub const fn simulated() -> Self {
        Self {
            max_trade_amount: dec!(100000),
            max_open_orders: 50,
        }
    }

    /// Limits used for live trading.
    #[must_use]
    pub const fn live() -> Self {
        Self {
            max_trade_amount: dec!(10000),
            max_open_orders: 10,
        }
    }
}

/// Risk limits for each trading mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeRiskLimits {
    /// Limits in dry-run.
    #[serde(default = "RiskLimits::simulated")]
    pub dry_run: RiskLimits,
    /// Limits in demo.
    #[serde(default = "RiskLimits::simulated")]
    pub demo: RiskLimits,
    /// Limits in live (also applied to a live rehearsal).
    #[serde(default = "RiskLimits::live")]
    pub live: RiskLimits,
}

impl Default for ModeRiskLimits {
    fn default() -> Self {
        Self {
            dry_run: RiskLimits::simulated(),
            demo: RiskLimits::simulated(),
            live: RiskLimits::live(),
        }
    }
}

impl ModeRiskLimits {
    /// Limits that apply in `mode`.
    #[must_use]
    pub const fn for_mode(&self, mode: TradingMode) -> &RiskLimits {
        match mode {
            TradingMode::DryRun => &self.dry_run,
            TradingMode::Demo => &self.demo,
            TradingMode::Live => &self.live,
        }
    }
}

/// Smallest base amount accepted per market.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinimumOrderSizes {
    /// Overrides keyed by market symbol.
    #[serde(default)]
    pub markets: HashMap<String, Decimal>,
    /// Minimum for markets without an override.
    #[serde(default = "default_minimum")]
    pub default: Decimal,
}

const fn default_minimum() -> Decimal {
    dec!(0.001)
}

impl Default for MinimumOrderSizes {
    fn default() -> Self {
        let markets = [
            ("BTC-EUR", dec!(0.001)),
            ("ETH-EUR", dec!(0.01)),
            ("ADA-EUR", dec!(1)),
            ("DOT-EUR", dec!(0.1)),
        ]
        .into_iter()
        .map(|(m, v)| (m.to_string(), v))
        .collect();

        Self {
            markets,
            default: default_minimum(),
        }
    }
}

impl MinimumOrderSizes {
    /// Minimum base amount for `market`.
    #[must_use]
    pub fn for_market(&self, market: &Market) -> Decimal {
        self.markets
            .get(&market.to_string())
            .copied()
            .unwrap_or(self.default)
    }
}
