//! Per-mode risk limits and minimum order sizes.

use serde::{Deserialize, Serialize};

use crate::domain::safety::{MinimumOrderSizes, ModeRiskLimits, RiskLimits};

/// Risk configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskConfig {
    /// Limits in dry-run.
    #[serde(default = "RiskLimits::simulated")]
    pub dry_run: RiskLimits,
    /// Limits in demo.
    #[serde(default = "RiskLimits::simulated")]
    pub demo: RiskLimits,
    /// Limits in live, including a live rehearsal under the dry-run lock.
    #[serde(default = "RiskLimits::live")]
    pub live: RiskLimits,
    /// Smallest accepted base amount per market.
    #[serde(default)]
    pub minimum_order_sizes: MinimumOrderSizes,
}

impl Default for RiskConfig {
    fn default() -> Self {
        let limits = ModeRiskLimits::default();
        Self {
            dry_run: limits.dry_run,
            demo: limits.demo,
            live: limits.live,
            minimum_order_sizes: MinimumOrderSizes::default(),
        }
    }
}

impl RiskConfig {
    /// The limits as the validator consumes them.
    #[must_use]
    pub const fn mode_limits(&self) -> ModeRiskLimits {
        ModeRiskLimits {
            dry_run: self.dry_run,
            demo: self.demo,
            live: self.live,
        }
    }
}
