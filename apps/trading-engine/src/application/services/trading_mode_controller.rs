//! Trading mode controller.
//!
//! Owns the one process-wide mode value. Reads are cheap snapshots; writes
//! go through [`TradingModeController::set_mode`] (serialized, credential
//! guarded) or [`TradingModeController::enable_emergency_dry_run`]
//! (never waits for anything).

use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::application::ports::{CredentialError, CredentialProvider};
use crate::domain::trading_mode::{ModeSnapshot, ModeState, TradingMode};
use crate::error::{ErrorCode, ExecutionError};
use crate::observability;

/// Why a mode switch did not commit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModeError {
    /// Live mode requires credentials that exist and are accepted right now.
    #[error("cannot enable live trading: {source}")]
    CredentialValidation {
        /// Underlying credential problem.
        #[source]
        source: CredentialError,
    },

    /// Another transition (usually the emergency switch) committed while
    /// this one was validating.
    #[error("switch to {target} interrupted by a concurrent mode change")]
    Interrupted {
        /// Requested mode.
        target: TradingMode,
    },
}

impl From<ModeError> for ExecutionError {
    fn from(err: ModeError) -> Self {
        let message = err.to_string();
        match err {
            ModeError::CredentialValidation { .. } => Self::credential_validation(message),
            ModeError::Interrupted { target } => {
                Self::new(ErrorCode::ModeSwitchInterrupted, message)
                    .with_context("target_mode", target.as_str())
            }
        }
    }
}

/// Whether live trading could happen right now, judged from configuration
/// and mode alone (no network).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveReadiness {
    /// All requirements met.
    pub can_trade_live: bool,
    /// First unmet requirement, or a confirmation.
    pub message: String,
    /// Credentials are configured.
    pub credentials_configured: bool,
    /// Mode is live.
    pub mode_is_live: bool,
    /// Dry-run lock is released.
    pub dry_run_disabled: bool,
}

/// Guarded owner of the trading mode.
pub struct TradingModeController {
    state: RwLock<ModeState>,
    switch_lock: Mutex<()>,
    credentials: Arc<dyn CredentialProvider>,
}

impl TradingModeController {
    /// Create a controller. A process never starts in live mode; a live
    /// initial mode is downgraded to dry-run.
    pub fn new(initial: TradingMode, credentials: Arc<dyn CredentialProvider>) -> Self {
        let initial = if initial.is_live() {
            tracing::warn!("Refusing to start in live mode, starting in dry_run");
            TradingMode::DryRun
        } else {
            initial
        };

        Self {
            state: RwLock::new(ModeState::initial(initial)),
            switch_lock: Mutex::new(()),
            credentials,
        }
    }

    /// Current mode snapshot. Side-effect free.
    pub fn status(&self) -> ModeSnapshot {
        self.read_state().snapshot()
    }

    /// Switch mode.
    ///
    /// Entering live with `force_dry_run = false` re-validates credentials
    /// immediately before committing; a credential that was valid earlier
    /// is not enough. On any error the mode is left unchanged.
    pub async fn set_mode(
        &self,
        target: TradingMode,
        force_dry_run: bool,
    ) -> Result<ModeSnapshot, ModeError> {
        let _switch = self.switch_lock.lock().await;
        let observed_epoch = self.read_state().epoch();

        if target.is_live()
            && !force_dry_run
            && let Err(source) = self.credentials.validate().await
        {
            tracing::warn!(error = %source, "Live mode refused, credential validation failed");
            return Err(ModeError::CredentialValidation { source });
        }

        let snapshot = {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            if state.epoch() != observed_epoch {
                tracing::warn!(%target, "Mode switch lost race with a concurrent change");
                return Err(ModeError::Interrupted { target });
            }
            state.commit(target, force_dry_run);
            state.snapshot()
        };

        if snapshot.is_live_trading {
            tracing::warn!(mode = %target, "LIVE TRADING MODE ACTIVATED");
        } else {
            tracing::info!(
                mode = %target,
                dry_run_enabled = snapshot.dry_run_enabled,
                "Trading mode switched"
            );
        }
        observability::record_mode_transition(target);

        Ok(snapshot)
    }

    /// Force dry-run immediately.
    ///
    /// Does not wait for in-flight switches or executions and always
    /// succeeds. Executions that already captured a live snapshot finish
    /// on the gateway they resolved; every later execution sees dry-run.
    pub fn enable_emergency_dry_run(&self) -> ModeSnapshot {
        let snapshot = {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            state.force_dry_run();
            state.snapshot()
        };

        tracing::warn!("EMERGENCY DRY RUN enabled, all trading is simulated");
        observability::record_emergency_dry_run();

        snapshot
    }

    /// Live-trading readiness from configuration and the current mode.
    pub fn live_readiness(&self) -> LiveReadiness {
        let snapshot = self.status();
        let credentials_configured = self.credentials.is_configured();
        let mode_is_live = snapshot.current_mode.is_live();
        let dry_run_disabled = !snapshot.dry_run_enabled;

        let message = if !credentials_configured {
            CredentialError::Missing.to_string()
        } else if !mode_is_live {
            format!("Trading mode is {}, not live", snapshot.current_mode)
        } else if !dry_run_disabled {
            "Dry run mode is still active".to_string()
        } else {
            "Live trading requirements satisfied".to_string()
        };

        LiveReadiness {
            can_trade_live: credentials_configured && mode_is_live && dry_run_disabled,
            message,
            credentials_configured,
            mode_is_live,
            dry_run_disabled,
        }
    }

    fn read_state(&self) -> ModeState {
        *self.state.read().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for TradingModeController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TradingModeController")
            .field("state", &self.read_state())
            .finish_non_exhaustive()
    }
}
