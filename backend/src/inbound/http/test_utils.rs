//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use crate::domain::UploadStaging;
use crate::domain::ports::{
    AccountQuery, FixtureAccountQuery, FixtureGenerationCommand, FixtureIdentityProvider,
    GenerationCommand,
};

use super::state::{HttpState, HttpStatePorts};

/// State wired entirely with fixture ports; UUID tokens authenticate.
pub fn fixture_state() -> HttpState {
    state_with(Arc::new(FixtureGenerationCommand), Arc::new(FixtureAccountQuery))
}

/// Fixture identity and staging with the given use-case ports.
pub fn state_with(
    generation: Arc<dyn GenerationCommand>,
    accounts: Arc<dyn AccountQuery>,
) -> HttpState {
    HttpState::new(
        HttpStatePorts {
            generation,
            accounts,
            identity: Arc::new(FixtureIdentityProvider),
        },
        UploadStaging::new(std::env::temp_dir().join("headshot-http-tests")),
    )
}
