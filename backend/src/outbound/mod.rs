//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL-backed ledger and history using Diesel ORM
//! - **memory**: in-process ledger and history for development and tests
//! - **upstream**: reqwest client for the image generation service
//! - **identity**: signed bearer token verification
//! - **metrics**: Prometheus-backed metrics exporters (feature-gated)
//!
//! Adapters are thin translators between domain types and infrastructure
//! representations. They contain no business logic.

pub mod identity;
pub mod memory;
#[cfg(feature = "metrics")]
pub mod metrics;
pub mod persistence;
pub mod upstream;
