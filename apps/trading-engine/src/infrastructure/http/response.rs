//! HTTP response DTOs.

use serde::{Deserialize, Serialize};

use crate::application::services::LiveReadiness;
use crate::domain::trading_mode::{ModeSnapshot, TradingMode};

/// `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `healthy` when the server answers.
    pub status: String,
    /// Crate version.
    pub version: String,
    /// Current trading mode.
    pub trading_mode: TradingMode,
}

/// Mode status as shown to operators. Also the answer to every mode
/// transition, including the emergency switch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModeStatusResponse {
    /// Active mode.
    pub current_mode: TradingMode,
    /// Dry-run lock state.
    pub dry_run_enabled: bool,
    /// Real orders are being placed.
    pub is_live_trading: bool,
    /// Warning banner text.
    pub warning_message: String,
    /// Whether live trading could proceed right now.
    pub can_trade_live: bool,
    /// Why, or why not.
    pub validation_message: String,
    /// Feedback for the action that produced this response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ModeStatusResponse {
    /// Combine a snapshot with readiness.
    #[must_use]
    pub fn new(snapshot: ModeSnapshot, readiness: LiveReadiness) -> Self {
        Self {
            current_mode: snapshot.current_mode,
            dry_run_enabled: snapshot.dry_run_enabled,
            is_live_trading: snapshot.is_live_trading,
            warning_message: snapshot.warning_message,
            can_trade_live: readiness.can_trade_live,
            validation_message: readiness.message,
            message: None,
        }
    }

    /// Attach an action message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Breakdown of live-trading requirements.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveRequirementDetails {
    /// Credentials are configured.
    pub credentials_configured: bool,
    /// Mode is live.
    pub mode_is_live: bool,
    /// Dry-run lock is released.
    pub dry_run_disabled: bool,
}

/// `GET /api/v1/trading-mode/validate-live`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateLiveResponse {
    /// All requirements hold.
    pub can_trade_live: bool,
    /// Operator-facing summary.
    pub requirements: String,
    /// Active mode.
    pub current_mode: TradingMode,
    /// Per-requirement flags.
    pub details: LiveRequirementDetails,
}

impl ValidateLiveResponse {
    /// Build from a readiness check.
    #[must_use]
    pub fn new(current_mode: TradingMode, readiness: LiveReadiness) -> Self {
        Self {
            can_trade_live: readiness.can_trade_live,
            requirements: readiness.message,
            current_mode,
            details: LiveRequirementDetails {
                credentials_configured: readiness.credentials_configured,
                mode_is_live: readiness.mode_is_live,
                dry_run_disabled: readiness.dry_run_disabled,
            },
        }
    }
}
