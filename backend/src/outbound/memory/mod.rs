//! In-memory adapters for development runs without a database and for tests.
//!
//! State lives behind a `std::sync::Mutex`; every operation holds the lock for
//! a single map access, so the conditional debit stays atomic.

mod accounts;
mod history;

pub use accounts::InMemoryAccountStore;
pub use history::InMemoryHistoryRepository;
