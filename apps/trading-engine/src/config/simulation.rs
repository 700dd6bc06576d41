//! Simulated exchange settings shared by the dry-run and demo gateways.

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Simulation configuration.
///
/// Both simulators start from the same balances and prices but keep
/// separate books. Only the demo simulator applies slippage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Starting balance per asset.
    #[serde(default = "default_starting_balances")]
    pub starting_balances: BTreeMap<String, Decimal>,
    /// Fill price per market symbol.
    #[serde(default = "default_reference_prices")]
    pub reference_prices: HashMap<String, Decimal>,
    /// Fee as a fraction of notional.
    #[serde(default = "default_fee_rate")]
    pub fee_rate: Decimal,
    /// Largest adverse slippage for demo fills, in basis points.
    #[serde(default = "default_demo_max_slippage_bps")]
    pub demo_max_slippage_bps: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            starting_balances: default_starting_balances(),
            reference_prices: default_reference_prices(),
            fee_rate: default_fee_rate(),
            demo_max_slippage_bps: default_demo_max_slippage_bps(),
        }
    }
}

fn default_starting_balances() -> BTreeMap<String, Decimal> {
    [("EUR", dec!(10000)), ("BTC", dec!(0.1)), ("ETH", dec!(1))]
        .into_iter()
        .map(|(asset, amount)| (asset.to_string(), amount))
        .collect()
}

fn default_reference_prices() -> HashMap<String, Decimal> {
    [
        ("BTC-EUR", dec!(50000)),
        ("ETH-EUR", dec!(3000)),
        ("ADA-EUR", dec!(0.5)),
        ("DOT-EUR", dec!(7)),
    ]
    .into_iter()
    .map(|(market, price)| (market.to_string(), price))
    .collect()
}

const fn default_fee_rate() -> Decimal {
    dec!(0.0025)
}

const fn default_demo_max_slippage_bps() -> u32 {
    25
}
