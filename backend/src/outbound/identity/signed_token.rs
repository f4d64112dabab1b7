//! HMAC-signed tokens binding a user id to a server secret.
//!
//! A token reads `<uuid>.<hex(hmac_sha256(secret, uuid))>`. Issuing tokens is a
//! development convenience; production deployments mount the secret from a
//! file shared with whichever service hands tokens out.

use std::path::Path;

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::domain::UserId;
use crate::domain::ports::{IdentityProvider, IdentityProviderError};

const SEPARATOR: char = '.';
const MIN_SECRET_LEN: usize = 32;

type HmacSha256 = Hmac<Sha256>;

/// Failures while loading the signing secret.
#[derive(Debug, thiserror::Error)]
pub enum TokenSecretError {
    #[error("failed to read token secret from {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("token secret must be at least {MIN_SECRET_LEN} bytes, got {length}")]
    TooShort { length: usize },
    #[error("token secret rejected as HMAC key: {message}")]
    InvalidKey { message: String },
}

/// Identity provider verifying signed bearer tokens.
pub struct SignedTokenIdentityProvider {
    mac: HmacSha256,
}

impl SignedTokenIdentityProvider {
    /// Build a provider around an in-memory secret.
    ///
    /// # Errors
    ///
    /// Returns [`TokenSecretError::TooShort`] for secrets under 32 bytes.
    pub fn new(secret: Zeroizing<Vec<u8>>) -> Result<Self, TokenSecretError> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(TokenSecretError::TooShort {
                length: secret.len(),
            });
        }
        let mac = HmacSha256::new_from_slice(secret.as_slice()).map_err(|err| {
            TokenSecretError::InvalidKey {
                message: err.to_string(),
            }
        })?;
        Ok(Self { mac })
    }

    /// Load the secret from a file, trimming a trailing newline.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read or holds too short a secret.
    pub fn from_file(path: &Path) -> Result<Self, TokenSecretError> {
        let mut raw = Zeroizing::new(std::fs::read(path).map_err(|source| {
            TokenSecretError::Read {
                path: path.display().to_string(),
                source,
            }
        })?);
        while raw.last().is_some_and(|byte| byte.is_ascii_whitespace()) {
            raw.pop();
        }
        Self::new(raw)
    }

    /// Provider with a random per-process secret.
    ///
    /// Tokens issued by it stop working on restart.
    ///
    /// # Errors
    ///
    /// Propagates key setup failures from [`Self::new`].
    pub fn ephemeral() -> Result<Self, TokenSecretError> {
        let mut secret = Zeroizing::new(Vec::with_capacity(MIN_SECRET_LEN));
        secret.extend_from_slice(uuid::Uuid::new_v4().as_bytes());
        secret.extend_from_slice(uuid::Uuid::new_v4().as_bytes());
        Self::new(secret)
    }

    /// Mint a token for `user_id`.
    pub fn issue(&self, user_id: &UserId) -> String {
        format!("{user_id}{SEPARATOR}{}", hex::encode(self.sign(user_id.as_ref())))
    }

    fn keyed(&self, subject: &str) -> HmacSha256 {
        let mut mac = self.mac.clone();
        mac.update(subject.as_bytes());
        mac
    }

    fn sign(&self, subject: &str) -> Vec<u8> {
        self.keyed(subject).finalize().into_bytes().to_vec()
    }
}

#[async_trait]
impl IdentityProvider for SignedTokenIdentityProvider {
    async fn resolve(&self, token: &str) -> Result<UserId, IdentityProviderError> {
        let (subject, signature) = token
            .split_once(SEPARATOR)
            .ok_or_else(|| IdentityProviderError::malformed("missing signature"))?;
        let user_id = UserId::new(subject)
            .map_err(|err| IdentityProviderError::malformed(err.to_string()))?;
        let provided = hex::decode(signature)
            .map_err(|_| IdentityProviderError::malformed("signature is not hex"))?;

        self.keyed(user_id.as_ref())
            .verify_slice(&provided)
            .map_err(|_| IdentityProviderError::rejected())?;
        Ok(user_id)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn provider() -> SignedTokenIdentityProvider {
        SignedTokenIdentityProvider::new(Zeroizing::new(vec![7_u8; 32])).expect("secret")
    }

    #[rstest]
    #[tokio::test]
    async fn issued_tokens_resolve(provider: SignedTokenIdentityProvider) {
        let user_id = UserId::random();
        let token = provider.issue(&user_id);

        assert_eq!(provider.resolve(&token).await.expect("valid token"), user_id);
    }

    #[rstest]
    #[tokio::test]
    async fn tokens_from_another_secret_are_rejected(provider: SignedTokenIdentityProvider) {
        let other = SignedTokenIdentityProvider::ephemeral().expect("ephemeral secret");
        let token = other.issue(&UserId::random());

        assert_eq!(
            provider.resolve(&token).await.expect_err("foreign token"),
            IdentityProviderError::Rejected
        );
    }

    #[rstest]
    #[tokio::test]
    async fn swapped_subject_is_rejected(provider: SignedTokenIdentityProvider) {
        let token = provider.issue(&UserId::random());
        let (_, signature) = token.split_once('.').expect("separator");
        let forged = format!("{}.{signature}", UserId::random());

        assert_eq!(
            provider.resolve(&forged).await.expect_err("forged token"),
            IdentityProviderError::Rejected
        );
    }

    #[rstest]
    #[case("no-separator")]
    #[case("not-a-uuid.abcd")]
    #[case("3fa85f64-5717-4562-b3fc-2c963f66afa6.zz")]
    #[tokio::test]
    async fn malformed_tokens_are_reported(
        provider: SignedTokenIdentityProvider,
        #[case] token: &str,
    ) {
        assert!(matches!(
            provider.resolve(token).await,
            Err(IdentityProviderError::Malformed { .. })
        ));
    }

    #[rstest]
    fn short_secrets_are_refused() {
        assert!(matches!(
            SignedTokenIdentityProvider::new(Zeroizing::new(vec![1_u8; 8])),
            Err(TokenSecretError::TooShort { length: 8 })
        ));
    }

    #[rstest]
    fn secret_files_are_trimmed() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "{}", "s".repeat(40)).expect("write secret");

        let provider = SignedTokenIdentityProvider::from_file(file.path()).expect("load secret");
        let untrimmed = SignedTokenIdentityProvider::new(Zeroizing::new(b"s".repeat(40)))
            .expect("in-memory secret");

        let user_id = UserId::random();
        assert_eq!(provider.issue(&user_id), untrimmed.issue(&user_id));
    }

    #[rstest]
    fn signatures_are_hmac_sha256_of_the_subject() {
        let provider = SignedTokenIdentityProvider::new(Zeroizing::new(b"Jefe".repeat(8)))
            .expect("secret");
        let mut reference = HmacSha256::new_from_slice(&b"Jefe".repeat(8)).expect("key");
        reference.update(b"3fa85f64-5717-4562-b3fc-2c963f66afa6");

        assert_eq!(
            provider.sign("3fa85f64-5717-4562-b3fc-2c963f66afa6"),
            reference.finalize().into_bytes().to_vec()
        );
    }

    #[rstest]
    #[tokio::test]
    async fn truncated_signatures_are_rejected(provider: SignedTokenIdentityProvider) {
        let token = provider.issue(&UserId::random());
        let truncated = &token[..token.len() - 2];

        assert_eq!(
            provider.resolve(truncated).await.expect_err("truncated token"),
            IdentityProviderError::Rejected
        );
    }
}
