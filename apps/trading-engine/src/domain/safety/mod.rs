//! Pre-trade safety rules.
//!
//! Pure validation with no I/O. The order of checks is fixed
//! (shape, then balance, then risk) so the first violation reported for a
//! given request is deterministic.

mod limits;
mod validator;

pub use limits::{MinimumOrderSizes, ModeRiskLimits, RiskLimits};
pub use validator::{SafetyValidator, SafetyViolation, ValidationContext};
