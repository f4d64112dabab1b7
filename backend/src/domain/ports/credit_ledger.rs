//! Port for credit balance storage.
//!
//! The ledger is the only component allowed to change a balance. Adapters must
//! implement [`CreditLedger::try_debit`] as a single conditional decrement so
//! that concurrent generations for one account can never drive the balance
//! below zero.

use async_trait::async_trait;

use crate::domain::{Credits, GenerationCost, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by credit ledger adapters.
    pub enum CreditLedgerError {
        /// Ledger connection could not be established.
        Connection { message: String } =>
            "credit ledger connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "credit ledger query failed: {message}",
    }
}

/// Result of a conditional debit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebitOutcome {
    /// The cost was subtracted; `remaining` is the new balance.
    Debited { remaining: Credits },
    /// The balance was below the cost and was left untouched.
    Insufficient { balance: Credits },
    /// No balance exists for the account.
    UnknownAccount,
}

/// Port for reading and atomically debiting credit balances.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CreditLedger: Send + Sync {
    /// Current balance, or `None` when the account is unknown.
    async fn balance(&self, user_id: &UserId) -> Result<Option<Credits>, CreditLedgerError>;

    /// Subtract `cost` only if the balance still covers it.
    ///
    /// The check and the write form one atomic step.
    async fn try_debit(
        &self,
        user_id: &UserId,
        cost: GenerationCost,
    ) -> Result<DebitOutcome, CreditLedgerError>;
}

/// Fixture ledger that reports a generous balance and accepts every debit.
///
/// The balance never changes; use the in-memory adapter where arithmetic
/// matters.
#[derive(Debug, Clone, Copy)]
pub struct FixtureCreditLedger {
    balance: Credits,
}

impl FixtureCreditLedger {
    /// Fixture reporting `balance` for every account.
    pub const fn with_balance(balance: Credits) -> Self {
        Self { balance }
    }
}

impl Default for FixtureCreditLedger {
    fn default() -> Self {
        Self::with_balance(Credits::new(100))
    }
}

#[async_trait]
impl CreditLedger for FixtureCreditLedger {
    async fn balance(&self, _user_id: &UserId) -> Result<Option<Credits>, CreditLedgerError> {
        Ok(Some(self.balance))
    }

    async fn try_debit(
        &self,
        _user_id: &UserId,
        cost: GenerationCost,
    ) -> Result<DebitOutcome, CreditLedgerError> {
        Ok(match self.balance.checked_debit(cost) {
            Some(remaining) => DebitOutcome::Debited { remaining },
            None => DebitOutcome::Insufficient {
                balance: self.balance,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(100, DebitOutcome::Debited { remaining: Credits::new(75) })]
    #[case(24, DebitOutcome::Insufficient { balance: Credits::new(24) })]
    #[tokio::test]
    async fn fixture_ledger_applies_cost(#[case] balance: u32, #[case] expected: DebitOutcome) {
        let ledger = FixtureCreditLedger::with_balance(Credits::new(balance));
        let outcome = ledger
            .try_debit(&UserId::random(), GenerationCost::default())
            .await
            .expect("fixture debit");
        assert_eq!(outcome, expected);
    }

    #[rstest]
    fn query_error_formats_message() {
        let error = CreditLedgerError::query("relation missing");
        assert_eq!(error.to_string(), "credit ledger query failed: relation missing");
    }
}
