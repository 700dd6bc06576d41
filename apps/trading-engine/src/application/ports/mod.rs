//! Driven ports.
//!
//! Interfaces the application needs from the outside world: exchange
//! gateways, a credential provider, and an order journal.

mod credential_port;
mod exchange_port;
mod journal_port;

#[cfg(test)]
pub use credential_port::MockCredentialProvider;
pub use credential_port::{CredentialError, CredentialProvider, CredentialSet};
pub use exchange_port::{ExchangePort, GatewayError, RealExchangeConnector};
pub use journal_port::{JournalEntry, JournalError, JournalOutcome, OrderJournal};
