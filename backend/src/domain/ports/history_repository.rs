//! Port for generation history persistence.
//!
//! History is append-only. Inserts are keyed on [`HistoryRecord::id`], which
//! is fixed before the credit deduction, so an insert repeated after an
//! ambiguous failure cannot produce a second row.
//!
//! [`HistoryRecord::id`]: crate::domain::HistoryRecord

use async_trait::async_trait;

use crate::domain::{HistoryRecord, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by history repository adapters.
    pub enum HistoryRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "history repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "history repository query failed: {message}",
    }
}

/// Port for storing and listing generation history.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HistoryRepository: Send + Sync {
    /// Persist a record. Inserting an id that already exists is a no-op.
    async fn insert(&self, record: &HistoryRecord) -> Result<(), HistoryRepositoryError>;

    /// All records owned by `owner`, newest first.
    async fn list_for_owner(
        &self,
        owner: &UserId,
    ) -> Result<Vec<HistoryRecord>, HistoryRepositoryError>;
}

/// Fixture repository that discards inserts and lists nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureHistoryRepository;

#[async_trait]
impl HistoryRepository for FixtureHistoryRepository {
    async fn insert(&self, _record: &HistoryRecord) -> Result<(), HistoryRepositoryError> {
        Ok(())
    }

    async fn list_for_owner(
        &self,
        _owner: &UserId,
    ) -> Result<Vec<HistoryRecord>, HistoryRepositoryError> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fixture_repository_lists_nothing() {
        let records = FixtureHistoryRepository
            .list_for_owner(&UserId::random())
            .await
            .expect("fixture list");
        assert!(records.is_empty());
    }
}
