//! Port for resolving bearer credentials to account identities.

use async_trait::async_trait;

use crate::domain::UserId;

use super::define_port_error;

define_port_error! {
    /// Errors raised while resolving a credential.
    pub enum IdentityProviderError {
        /// The credential is not in the expected format.
        Malformed { message: String } => "malformed credential: {message}",
        /// The credential is well formed but not valid.
        Rejected => "credential rejected",
    }
}

/// Port mapping an opaque bearer token onto a [`UserId`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolve `token` to the identity it was issued for.
    async fn resolve(&self, token: &str) -> Result<UserId, IdentityProviderError>;
}

/// Fixture provider that treats any UUID token as that user's identity.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureIdentityProvider;

#[async_trait]
impl IdentityProvider for FixtureIdentityProvider {
    async fn resolve(&self, token: &str) -> Result<UserId, IdentityProviderError> {
        UserId::new(token).map_err(|err| IdentityProviderError::malformed(err.to_string()))
    }
}
