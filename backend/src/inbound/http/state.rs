//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use crate::domain::UploadStaging;
use crate::domain::ports::{AccountQuery, GenerationCommand, IdentityProvider};

/// Parameter object bundling the port implementations used by handlers.
#[derive(Clone)]
pub struct HttpStatePorts {
    pub generation: Arc<dyn GenerationCommand>,
    pub accounts: Arc<dyn AccountQuery>,
    pub identity: Arc<dyn IdentityProvider>,
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub generation: Arc<dyn GenerationCommand>,
    pub accounts: Arc<dyn AccountQuery>,
    pub identity: Arc<dyn IdentityProvider>,
    pub staging: UploadStaging,
}

impl HttpState {
    /// Construct state from the ports bundle and the upload staging area.
    ///
    /// # Examples
    /// ```no_run
    /// use std::sync::Arc;
    ///
    /// use headshot_backend::domain::UploadStaging;
    /// use headshot_backend::domain::ports::{
    ///     FixtureAccountQuery, FixtureGenerationCommand, FixtureIdentityProvider,
    /// };
    /// use headshot_backend::inbound::http::state::{HttpState, HttpStatePorts};
    ///
    /// let ports = HttpStatePorts {
    ///     generation: Arc::new(FixtureGenerationCommand),
    ///     accounts: Arc::new(FixtureAccountQuery),
    ///     identity: Arc::new(FixtureIdentityProvider),
    /// };
    /// let state = HttpState::new(ports, UploadStaging::new(std::env::temp_dir()));
    /// let _generation = state.generation.clone();
    /// ```
    pub fn new(ports: HttpStatePorts, staging: UploadStaging) -> Self {
        let HttpStatePorts {
            generation,
            accounts,
            identity,
        } = ports;
        Self {
            generation,
            accounts,
            identity,
            staging,
        }
    }
}
