//! Domain layer.
//!
//! Pure types and rules with no I/O: trading modes and their derived
//! flags, order requests and results, balances, and the safety rules an
//! order must pass before it may reach any exchange.

pub mod order_execution;
pub mod safety;
pub mod shared;
pub mod trading_mode;
