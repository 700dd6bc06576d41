//! The three trading modes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Process-wide trading mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradingMode {
    /// No network call that could move funds is ever issued; fills are synthetic.
    #[default]
    DryRun,
    /// Simulated trading with more realistic synthetic fills.
    Demo,
    /// Validated orders go to the real exchange.
    Live,
}

impl TradingMode {
    /// Every mode, in escalation order.
    pub const ALL: [Self; 3] = [Self::DryRun, Self::Demo, Self::Live];

    /// Wire name (`dry_run`, `demo`, `live`).
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::DryRun => "dry_run",
            Self::Demo => "demo",
            Self::Live => "live",
        }
    }

    /// Whether this is the live mode.
    #[must_use]
    pub const fn is_live(&self) -> bool {
        matches!(self, Self::Live)
    }
}

impl fmt::Display for TradingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown trading mode name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown trading mode '{0}', expected one of: dry_run, demo, live")]
pub struct ParseTradingModeError(pub String);

impl FromStr for TradingMode {
    type Err = ParseTradingModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "dry_run" | "dryrun" => Ok(Self::DryRun),
            "demo" => Ok(Self::Demo),
            "live" => Ok(Self::Live),
            _ => Err(ParseTradingModeError(s.to_string())),
        }
    }
}
