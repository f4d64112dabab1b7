//! Driving port for account read models.
//!
//! Backs the profile and history endpoints without exposing the ledger or the
//! history repository to inbound adapters.

use async_trait::async_trait;

use crate::domain::{Credits, Error, HistoryRecord, UserAccount, UserId};

/// Domain use-case port for reading an account and its history.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountQuery: Send + Sync {
    /// Identity and current balance of the authenticated user.
    async fn account(&self, user_id: &UserId) -> Result<UserAccount, Error>;

    /// Generation history of the authenticated user, newest first.
    async fn history(&self, user_id: &UserId) -> Result<Vec<HistoryRecord>, Error>;
}

/// Fixture query reporting a fixed balance and no history.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureAccountQuery;

#[async_trait]
impl AccountQuery for FixtureAccountQuery {
    async fn account(&self, user_id: &UserId) -> Result<UserAccount, Error> {
        Ok(UserAccount {
            id: user_id.clone(),
            credits: Credits::new(100),
        })
    }

    async fn history(&self, _user_id: &UserId) -> Result<Vec<HistoryRecord>, Error> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[tokio::test]
    async fn fixture_query_echoes_requested_user() {
        let user_id = UserId::random();
        let account = FixtureAccountQuery
            .account(&user_id)
            .await
            .expect("fixture account");
        assert_eq!(account.id, user_id);
    }
}
