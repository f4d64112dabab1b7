//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! - **Thin adapters**: repositories translate between Diesel rows and domain
//!   types and contain no business rules.
//! - **Internal models**: row structs (`models.rs`) and table definitions
//!   (`schema.rs`) never leave this module.
//! - **Async pooling**: `bb8` pools through `diesel-async`.
//! - **Typed errors**: database failures map onto the port error enums.

mod diesel_credit_ledger;
mod diesel_history_repository;
mod error_mapping;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_credit_ledger::DieselCreditLedger;
pub use diesel_history_repository::DieselHistoryRepository;
pub use migrations::{MIGRATIONS, MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
