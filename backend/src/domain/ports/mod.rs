//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driving ports (`GenerationCommand`, `AccountQuery`) are called by inbound
//! adapters. Driven ports (ledger, history, backend, identity, metrics) are
//! implemented by outbound adapters.

mod macros;
pub(crate) use macros::define_port_error;

mod account_query;
mod credit_ledger;
mod generation_backend;
mod generation_command;
mod generation_metrics;
mod history_repository;
mod identity_provider;

#[cfg(test)]
pub use account_query::MockAccountQuery;
pub use account_query::{AccountQuery, FixtureAccountQuery};
#[cfg(test)]
pub use credit_ledger::MockCreditLedger;
pub use credit_ledger::{CreditLedger, CreditLedgerError, DebitOutcome, FixtureCreditLedger};
#[cfg(test)]
pub use generation_backend::MockGenerationBackend;
pub use generation_backend::{
    FIXTURE_IMAGE_URL, FixtureGenerationBackend, GenerationBackend, GenerationBackendError,
};
#[cfg(test)]
pub use generation_command::MockGenerationCommand;
pub use generation_command::{
    FixtureGenerationCommand, GenerateRequest, GenerateResponse, GenerationCommand,
};
#[cfg(test)]
pub use generation_metrics::MockGenerationMetrics;
pub use generation_metrics::{
    GenerationMetrics, GenerationMetricsError, GenerationOutcome, NoOpGenerationMetrics,
};
#[cfg(test)]
pub use history_repository::MockHistoryRepository;
pub use history_repository::{
    FixtureHistoryRepository, HistoryRepository, HistoryRepositoryError,
};
#[cfg(test)]
pub use identity_provider::MockIdentityProvider;
pub use identity_provider::{FixtureIdentityProvider, IdentityProvider, IdentityProviderError};
