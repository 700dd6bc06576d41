//! Persistence adapters.

mod in_memory_journal;

pub use in_memory_journal::InMemoryOrderJournal;
