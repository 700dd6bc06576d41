//! Trading mode: which kind of execution the process is currently allowed.
//!
//! The mode value, its derived flags and the transition rules live here.
//! The guarded, concurrent controller that owns the process-wide instance
//! lives in the application layer.

mod mode;
mod state;

pub use mode::{ParseTradingModeError, TradingMode};
pub use state::{ModeSnapshot, ModeState};
