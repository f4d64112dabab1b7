use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::ports::{HistoryRepository, HistoryRepositoryError};
use crate::domain::{HistoryRecord, UserId};

/// Append-only generation history held in process memory.
#[derive(Debug, Default)]
pub struct InMemoryHistoryRepository {
    records: Mutex<Vec<HistoryRecord>>,
}

impl InMemoryHistoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<HistoryRecord>>, HistoryRepositoryError> {
        self.records
            .lock()
            .map_err(|_| HistoryRepositoryError::query("history store lock poisoned"))
    }
}

#[async_trait]
impl HistoryRepository for InMemoryHistoryRepository {
    async fn insert(&self, record: &HistoryRecord) -> Result<(), HistoryRepositoryError> {
        let mut records = self.lock()?;
        if records.iter().all(|existing| existing.id != record.id) {
            records.push(record.clone());
        }
        Ok(())
    }

    async fn list_for_owner(
        &self,
        owner: &UserId,
    ) -> Result<Vec<HistoryRecord>, HistoryRepositoryError> {
        let mut owned: Vec<HistoryRecord> = self
            .lock()?
            .iter()
            .filter(|record| &record.owner == owner)
            .cloned()
            .collect();
        owned.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.as_uuid().cmp(a.id.as_uuid()))
        });
        Ok(owned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{HistoryRecordId, ImageReference, SourceReference};
    use chrono::{DateTime, TimeZone, Utc};
    use rstest::rstest;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, hour, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    fn record(owner: &UserId, created_at: DateTime<Utc>, url: &str) -> HistoryRecord {
        HistoryRecord {
            id: HistoryRecordId::random(),
            owner: owner.clone(),
            source_reference: SourceReference::from_file_name(Some("me.jpg")),
            result_reference: ImageReference::new(url).expect("reference"),
            created_at,
        }
    }

    #[rstest]
    #[tokio::test]
    async fn repeated_insert_keeps_one_record() {
        let repo = InMemoryHistoryRepository::new();
        let owner = UserId::random();
        let entry = record(&owner, at(9), "https://cdn/a.png");

        repo.insert(&entry).await.expect("first insert");
        repo.insert(&entry).await.expect("second insert");

        assert_eq!(repo.list_for_owner(&owner).await.expect("list"), vec![entry]);
    }

    #[rstest]
    #[tokio::test]
    async fn lists_only_the_owner_newest_first() {
        let repo = InMemoryHistoryRepository::new();
        let owner = UserId::random();
        let older = record(&owner, at(8), "https://cdn/old.png");
        let newer = record(&owner, at(10), "https://cdn/new.png");
        let foreign = record(&UserId::random(), at(11), "https://cdn/other.png");
        for entry in [&older, &newer, &foreign] {
            repo.insert(entry).await.expect("insert");
        }

        let listed = repo.list_for_owner(&owner).await.expect("list");

        assert_eq!(listed, vec![newer, older]);
    }
}
