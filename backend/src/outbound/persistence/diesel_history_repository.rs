//! PostgreSQL-backed `HistoryRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::debug;

use crate::domain::ports::{HistoryRepository, HistoryRepositoryError};
use crate::domain::{HistoryRecord, HistoryRecordId, ImageReference, SourceReference, UserId};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::{GenerationHistoryRow, NewGenerationHistoryRow};
use super::pool::{DbPool, PoolError};
use super::schema::generation_history;

/// Diesel-backed implementation of the `HistoryRepository` port.
///
/// Inserts use `ON CONFLICT (id) DO NOTHING`, which makes a repeated insert of
/// the same record harmless.
#[derive(Clone)]
pub struct DieselHistoryRepository {
    pool: DbPool,
}

impl DieselHistoryRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> HistoryRepositoryError {
    map_pool_error(error, HistoryRepositoryError::connection)
}

fn diesel_error(error: diesel::result::Error) -> HistoryRepositoryError {
    map_diesel_error(
        error,
        HistoryRepositoryError::query,
        HistoryRepositoryError::connection,
    )
}

fn row_to_record(row: GenerationHistoryRow) -> Result<HistoryRecord, HistoryRepositoryError> {
    let result_reference = ImageReference::new(row.result_reference).map_err(|err| {
        HistoryRepositoryError::query(format!("history row {} is corrupt: {err}", row.id))
    })?;
    Ok(HistoryRecord {
        id: HistoryRecordId::from_uuid(row.id),
        owner: UserId::from_uuid(row.owner_id),
        source_reference: SourceReference::from_stored(row.source_reference),
        result_reference,
        created_at: row.created_at,
    })
}

#[async_trait]
impl HistoryRepository for DieselHistoryRepository {
    async fn insert(&self, record: &HistoryRecord) -> Result<(), HistoryRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row = NewGenerationHistoryRow {
            id: *record.id.as_uuid(),
            owner_id: *record.owner.as_uuid(),
            source_reference: record.source_reference.as_str(),
            result_reference: record.result_reference.as_str(),
            created_at: record.created_at,
        };

        let inserted = diesel::insert_into(generation_history::table)
            .values(&row)
            .on_conflict(generation_history::id)
            .do_nothing()
            .execute(&mut conn)
            .await
            .map_err(diesel_error)?;
        if inserted == 0 {
            debug!(record_id = %record.id, "history record already present");
        }
        Ok(())
    }

    async fn list_for_owner(
        &self,
        owner: &UserId,
    ) -> Result<Vec<HistoryRecord>, HistoryRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let rows: Vec<GenerationHistoryRow> = generation_history::table
            .filter(generation_history::owner_id.eq(owner.as_uuid()))
            .order((
                generation_history::created_at.desc(),
                generation_history::id.desc(),
            ))
            .select(GenerationHistoryRow::as_select())
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;

        rows.into_iter().map(row_to_record).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn row(result_reference: &str) -> GenerationHistoryRow {
        GenerationHistoryRow {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            source_reference: "local_upload".to_owned(),
            result_reference: result_reference.to_owned(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn rows_convert_to_records() {
        let source = row("https://cdn/a.png");
        let expected_id = source.id;

        let record = row_to_record(source).expect("valid row");

        assert_eq!(record.id.as_uuid(), &expected_id);
        assert_eq!(record.result_reference.as_str(), "https://cdn/a.png");
        assert_eq!(record.source_reference.as_str(), "local_upload");
    }

    #[test]
    fn blank_result_reference_is_reported() {
        assert!(matches!(
            row_to_record(row("")),
            Err(HistoryRepositoryError::Query { .. })
        ));
    }
}
