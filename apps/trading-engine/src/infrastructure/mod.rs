//! Infrastructure Layer
//!
//! Adapters for the ports defined in the application layer:
//!
//! - **Driven adapters (outbound)**
//!   - `exchange/`: the in-memory simulator (dry-run, demo) and the
//!     Bitvavo REST adapter (live)
//!   - `credentials`: credential providers for the live gate
//!   - `persistence/`: the order journal
//!
//! - **Driver adapters (inbound)**
//!   - `http/`: REST API controllers
//!
//! - **Wiring**
//!   - `config/`: builds the object graph from [`crate::config::Config`]

pub mod config;
pub mod credentials;
pub mod exchange;
pub mod http;
pub mod persistence;
