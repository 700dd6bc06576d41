//! Order Journal Port (Driven Port)
//!
//! Append-only record of every execution attempt and its outcome.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::order_execution::{OrderResult, OrderSide};
use crate::domain::shared::{ClientOrderId, Market};
use crate::domain::trading_mode::TradingMode;
use crate::error::ExecutionError;

/// What happened to one execution attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum JournalOutcome {
    /// The executing gateway returned a result.
    Executed {
        /// The mode-stamped result.
        result: Box<OrderResult>,
    },
    /// The attempt failed; `code` is the error reason string.
    Failed {
        /// Error code.
        code: String,
        /// Error message.
        message: String,
        /// Exchange order id, when an ambiguous placement produced one.
        #[serde(skip_serializing_if = "Option::is_none")]
        exchange_order_id: Option<String>,
    },
}

impl JournalOutcome {
    /// Outcome for a failed attempt.
    #[must_use]
    pub fn failed(error: &ExecutionError) -> Self {
        Self::Failed {
            code: error.code().reason().to_string(),
            message: error.message().to_string(),
            exchange_order_id: error.context_value("exchange_order_id").map(str::to_string),
        }
    }
}

/// One journal record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Idempotency key of the attempt.
    pub client_order_id: ClientOrderId,
    /// Mode captured at the start of the attempt.
    pub mode: TradingMode,
    /// Trading pair.
    pub market: Market,
    /// Side.
    pub side: OrderSide,
    /// Result or error.
    #[serde(flatten)]
    pub outcome: JournalOutcome,
    /// When the entry was written.
    pub recorded_at: DateTime<Utc>,
}

/// Journal storage failure.
#[derive(Debug, Clone, thiserror::Error)]
pub enum JournalError {
    /// Backend failure.
    #[error("journal storage error: {message}")]
    Storage {
        /// Error details.
        message: String,
    },
}

/// Port for the execution journal.
#[async_trait]
pub trait OrderJournal: Send + Sync {
    /// Append an entry.
    async fn record(&self, entry: JournalEntry) -> Result<(), JournalError>;

    /// Most recent entries, newest first.
    async fn recent(&self, limit: usize) -> Result<Vec<JournalEntry>, JournalError>;

    /// Entry for an idempotency key: the latest executed one if there is
    /// one, otherwise the latest entry.
    async fn find_by_client_id(
        &self,
        client_order_id: &ClientOrderId,
    ) -> Result<Option<JournalEntry>, JournalError>;
}
