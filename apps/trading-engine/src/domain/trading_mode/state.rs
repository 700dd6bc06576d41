//! Mode state and its derived, immutable snapshot.

use serde::{Deserialize, Serialize};

use super::TradingMode;

/// Immutable view of the trading mode at one instant.
///
/// Every order captures exactly one of these at the start of execution and
/// never looks at the live value again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeSnapshot {
    /// Active mode.
    pub current_mode: TradingMode,
    /// True unless the mode is live and the dry-run lock is released.
    pub dry_run_enabled: bool,
    /// True only for live mode with the dry-run lock released.
    pub is_live_trading: bool,
    /// Operator-facing warning for the current state.
    pub warning_message: String,
}

impl ModeSnapshot {
    /// Derive the snapshot for a mode and dry-run lock.
    #[must_use]
    pub fn new(mode: TradingMode, dry_run_flag: bool) -> Self {
        let dry_run_enabled = dry_run_flag || !mode.is_live();
        let is_live_trading = mode.is_live() && !dry_run_flag;
        Self {
            current_mode: mode,
            dry_run_enabled,
            is_live_trading,
            warning_message: warning_for(mode, dry_run_flag).to_string(),
        }
    }

    /// Whether orders placed under this snapshot must go to the simulated exchange.
    #[must_use]
    pub const fn routes_to_simulation(&self) -> bool {
        !self.is_live_trading
    }
}

const fn warning_for(mode: TradingMode, dry_run_flag: bool) -> &'static str {
    match (mode, dry_run_flag) {
        (TradingMode::DryRun, _) => "DRY RUN MODE - no real trades are executed",
        (TradingMode::Demo, _) => "DEMO MODE - trades are simulated with demo data",
        (TradingMode::Live, true) => "LIVE MODE with DRY RUN - safety lock active",
        (TradingMode::Live, false) => "LIVE TRADING MODE - real trades are executed!",
    }
}

/// Mutable mode state owned by the mode controller.
///
/// `epoch` increases on every commit so a slow transition can detect that
/// another one (typically the emergency switch) landed while it was
/// validating credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeState {
    mode: TradingMode,
    dry_run_flag: bool,
    epoch: u64,
}

impl ModeState {
    /// Start-up state. The dry-run lock starts engaged.
    #[must_use]
    pub const fn initial(mode: TradingMode) -> Self {
        Self {
            mode,
            dry_run_flag: true,
            epoch: 0,
        }
    }

    /// Active mode.
    #[must_use]
    pub const fn mode(&self) -> TradingMode {
        self.mode
    }

    /// Commit counter.
    #[must_use]
    pub const fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Derived snapshot.
    #[must_use]
    pub fn snapshot(&self) -> ModeSnapshot {
        ModeSnapshot::new(self.mode, self.dry_run_flag)
    }

    /// Commit an operator transition.
    pub const fn commit(&mut self, target: TradingMode, force_dry_run: bool) {
        self.mode = target;
        self.dry_run_flag = force_dry_run;
        self.epoch += 1;
    }

    /// Force dry-run with the lock engaged, whatever the current state.
    pub const fn force_dry_run(&mut self) {
        self.mode = TradingMode::DryRun;
        self.dry_run_flag = true;
        self.epoch += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(TradingMode::DryRun, false, true, false ; "dry run")]
    #[test_case(TradingMode::Demo, false, true, false ; "demo")]
    #[test_case(TradingMode::Live, true, true, false ; "live rehearsal")]
    #[test_case(TradingMode::Live, false, false, true ; "live")]
    fn derived_flags(mode: TradingMode, flag: bool, dry_run_enabled: bool, is_live: bool) {
        let snapshot = ModeSnapshot::new(mode, flag);
        assert_eq!(snapshot.dry_run_enabled, dry_run_enabled);
        assert_eq!(snapshot.is_live_trading, is_live);
        assert_eq!(snapshot.routes_to_simulation(), !is_live);
    }

    #[test]
    fn live_warning_is_loud() {
        let snapshot = ModeSnapshot::new(TradingMode::Live, false);
        assert_eq!(
            snapshot.warning_message,
            "LIVE TRADING MODE - real trades are executed!"
        );
    }

    #[test]
    fn commits_bump_epoch() {
        let mut state = ModeState::initial(TradingMode::DryRun);
        state.commit(TradingMode::Demo, false);
        state.commit(TradingMode::Live, true);
        assert_eq!(state.epoch(), 2);
        assert_eq!(state.mode(), TradingMode::Live);

        state.force_dry_run();
        assert_eq!(state.epoch(), 3);
        assert_eq!(state.snapshot(), ModeSnapshot::new(TradingMode::DryRun, true));
    }
}
