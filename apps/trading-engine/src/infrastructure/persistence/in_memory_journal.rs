//! In-memory order journal.

use std::collections::VecDeque;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;

use crate::application::ports::{JournalEntry, JournalError, JournalOutcome, OrderJournal};
use crate::domain::shared::ClientOrderId;

/// Entries kept when no capacity is given.
pub const DEFAULT_CAPACITY: usize = 10_000;

/// Bounded, process-local implementation of `OrderJournal`.
///
/// The oldest entries are dropped once `capacity` is reached.
#[derive(Debug)]
pub struct InMemoryOrderJournal {
    entries: RwLock<VecDeque<JournalEntry>>,
    capacity: usize,
}

impl Default for InMemoryOrderJournal {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryOrderJournal {
    /// Journal with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Journal holding at most `capacity` entries (at least one).
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(VecDeque::new()),
            capacity: capacity.max(1),
        }
    }

    /// Number of entries held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the journal is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl OrderJournal for InMemoryOrderJournal {
    async fn record(&self, entry: JournalEntry) -> Result<(), JournalError> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
        Ok(())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<JournalEntry>, JournalError> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.iter().rev().take(limit).cloned().collect())
    }

    async fn find_by_client_id(
        &self,
        client_order_id: &ClientOrderId,
    ) -> Result<Option<JournalEntry>, JournalError> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let mut matching = entries
            .iter()
            .rev()
            .filter(|e| &e.client_order_id == client_order_id);
        let latest = matching.next();
        let executed = latest
            .into_iter()
            .chain(matching)
            .find(|e| matches!(e.outcome, JournalOutcome::Executed { .. }));
        Ok(executed.or(latest).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order_execution::OrderSide;
    use crate::domain::trading_mode::TradingMode;
    use crate::error::ExecutionError;
    use chrono::Utc;

    fn failed(key: &str) -> JournalEntry {
        JournalEntry {
            client_order_id: ClientOrderId::new(key),
            mode: TradingMode::DryRun,
            market: "BTC-EUR".parse().unwrap(),
            side: OrderSide::Buy,
            outcome: JournalOutcome::failed(&ExecutionError::gateway_unavailable("down")),
            recorded_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn recent_is_newest_first() {
        let journal = InMemoryOrderJournal::new();
        for key in ["a", "b", "c"] {
            journal.record(failed(key)).await.unwrap();
        }

        let recent = journal.recent(2).await.unwrap();

        let keys: Vec<_> = recent.iter().map(|e| e.client_order_id.as_str()).collect();
        assert_eq!(keys, ["c", "b"]);
    }

    #[tokio::test]
    async fn capacity_drops_oldest() {
        let journal = InMemoryOrderJournal::with_capacity(2);
        for key in ["a", "b", "c"] {
            journal.record(failed(key)).await.unwrap();
        }

        assert_eq!(journal.len(), 2);
        assert!(journal
            .find_by_client_id(&ClientOrderId::new("a"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn lookup_returns_latest_entry_for_key() {
        let journal = InMemoryOrderJournal::new();
        journal.record(failed("a")).await.unwrap();
        journal.record(failed("b")).await.unwrap();

        let found = journal
            .find_by_client_id(&ClientOrderId::new("a"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(found.client_order_id.as_str(), "a");
        assert!(matches!(found.outcome, JournalOutcome::Failed { .. }));
    }
}
