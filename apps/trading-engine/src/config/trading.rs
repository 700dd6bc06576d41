//! Trading mode and journal settings.

use serde::{Deserialize, Serialize};

use crate::domain::trading_mode::TradingMode;

/// Trading configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradingConfig {
    /// Mode at process start. Only `dry_run` and `demo` are accepted.
    #[serde(default)]
    pub initial_mode: TradingMode,
    /// Entries kept by the in-memory order journal.
    #[serde(default = "default_journal_capacity")]
    pub journal_capacity: usize,
}

impl Default for TradingConfig {
    fn default() -> Self {
        Self {
            initial_mode: TradingMode::DryRun,
            journal_capacity: default_journal_capacity(),
        }
    }
}

const fn default_journal_capacity() -> usize {
    10_000
}
