//! Account read service backing the profile and history endpoints.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::ports::{AccountQuery, CreditLedger, CreditLedgerError, HistoryRepository};
use crate::domain::{Error, HistoryRecord, UserAccount, UserId};

/// Account service implementing [`AccountQuery`].
pub struct AccountService<L: ?Sized, H: ?Sized> {
    ledger: Arc<L>,
    history: Arc<H>,
}

impl<L: ?Sized, H: ?Sized> AccountService<L, H> {
    /// Create a service over the given ledger and history stores.
    pub fn new(ledger: Arc<L>, history: Arc<H>) -> Self {
        Self { ledger, history }
    }
}

fn map_ledger_error(error: CreditLedgerError) -> Error {
    Error::internal("Failed to load account").with_cause(error.to_string())
}

#[async_trait]
impl<L, H> AccountQuery for AccountService<L, H>
where
    L: CreditLedger + ?Sized,
    H: HistoryRepository + ?Sized,
{
    async fn account(&self, user_id: &UserId) -> Result<UserAccount, Error> {
        let credits = self
            .ledger
            .balance(user_id)
            .await
            .map_err(map_ledger_error)?
            .ok_or_else(|| Error::not_found("Account not found"))?;
        Ok(UserAccount {
            id: user_id.clone(),
            credits,
        })
    }

    async fn history(&self, user_id: &UserId) -> Result<Vec<HistoryRecord>, Error> {
        self.history.list_for_owner(user_id).await.map_err(|err| {
            Error::internal("Failed to load generation history").with_cause(err.to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{
        FixtureHistoryRepository, HistoryRepositoryError, MockCreditLedger, MockHistoryRepository,
    };
    use crate::domain::{Credits, ErrorCode};
    use rstest::rstest;

    #[rstest]
    #[tokio::test]
    async fn account_reports_current_balance() {
        let mut ledger = MockCreditLedger::new();
        ledger
            .expect_balance()
            .return_once(|_| Ok(Some(Credits::new(42))));
        let service = AccountService::new(Arc::new(ledger), Arc::new(FixtureHistoryRepository));
        let user_id = UserId::random();

        let account = service.account(&user_id).await.expect("account");

        assert_eq!(account.id, user_id);
        assert_eq!(account.credits, Credits::new(42));
    }

    #[rstest]
    #[tokio::test]
    async fn missing_account_is_not_found() {
        let mut ledger = MockCreditLedger::new();
        ledger.expect_balance().return_once(|_| Ok(None));
        let service = AccountService::new(Arc::new(ledger), Arc::new(FixtureHistoryRepository));

        let error = service
            .account(&UserId::random())
            .await
            .expect_err("unknown account");

        assert_eq!(error.code(), ErrorCode::NotFound);
    }

    #[rstest]
    #[tokio::test]
    async fn history_failures_are_internal() {
        let mut history = MockHistoryRepository::new();
        history
            .expect_list_for_owner()
            .return_once(|_| Err(HistoryRepositoryError::connection("refused")));
        let service = AccountService::new(Arc::new(MockCreditLedger::new()), Arc::new(history));

        let error = service
            .history(&UserId::random())
            .await
            .expect_err("history failure");

        assert_eq!(error.code(), ErrorCode::InternalError);
        assert_eq!(
            error.cause(),
            Some("history repository connection failed: refused")
        );
    }
}
