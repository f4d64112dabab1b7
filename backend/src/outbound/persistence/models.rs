//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::generation_history;

/// Row struct for reading from the generation_history table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = generation_history)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct GenerationHistoryRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub source_reference: String,
    pub result_reference: String,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for appending history records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = generation_history)]
pub(crate) struct NewGenerationHistoryRow<'a> {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub source_reference: &'a str,
    pub result_reference: &'a str,
    pub created_at: DateTime<Utc>,
}
