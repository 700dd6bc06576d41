//! Exchange Gateways
//!
//! Implementations of `ExchangePort`: an in-memory simulator for the
//! dry-run and demo modes, and the Bitvavo REST adapter for live.

pub mod bitvavo;
pub mod simulated;

pub use bitvavo::{BitvavoConfig, BitvavoConnector, BitvavoError, BitvavoExchange};
pub use simulated::{SimulatedExchange, SimulatorSettings};
