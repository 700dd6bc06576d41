//! Balance snapshot.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Funds held in one asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AssetBalance {
    /// Free to trade.
    pub available: Decimal,
    /// Locked by open orders.
    pub reserved: Decimal,
}

impl AssetBalance {
    /// Balance with nothing reserved.
    #[must_use]
    pub const fn available(amount: Decimal) -> Self {
        Self {
            available: amount,
            reserved: Decimal::ZERO,
        }
    }

    /// Available plus reserved.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.available + self.reserved
    }
}

/// Balances by asset symbol, as seen by one gateway.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BalanceSnapshot(BTreeMap<String, AssetBalance>);

impl BalanceSnapshot {
    /// Empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Balance for `symbol`, zero if the asset is unknown.
    #[must_use]
    pub fn get(&self, symbol: &str) -> AssetBalance {
        self.0.get(symbol).copied().unwrap_or_default()
    }

    /// Available amount of `symbol`.
    #[must_use]
    pub fn available(&self, symbol: &str) -> Decimal {
        self.get(symbol).available
    }

    /// Set the balance of one asset.
    pub fn insert(&mut self, symbol: impl Into<String>, balance: AssetBalance) {
        self.0.insert(symbol.into(), balance);
    }

    /// Iterate over assets in symbol order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &AssetBalance)> {
        self.0.iter()
    }

    /// Number of assets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no asset is held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, AssetBalance)> for BalanceSnapshot {
    fn from_iter<T: IntoIterator<Item = (S, AssetBalance)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}
