//! Use cases.

mod execute_order;

pub use execute_order::{GatewayView, OrderExecutionService};
