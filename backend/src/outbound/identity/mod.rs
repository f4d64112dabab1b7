//! Bearer credential adapters.

mod signed_token;

pub use signed_token::{SignedTokenIdentityProvider, TokenSecretError};
