//! Application layer: ports, the mode controller, gateway resolution and
//! the order execution use case.

pub mod ports;
pub mod retry;
pub mod services;
pub mod use_cases;

#[cfg(test)]
pub(crate) mod testing;
