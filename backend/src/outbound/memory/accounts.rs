use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::ports::{CreditLedger, CreditLedgerError, DebitOutcome};
use crate::domain::{Credits, GenerationCost, UserId};

/// Credit balances held in process memory.
#[derive(Debug, Default)]
pub struct InMemoryAccountStore {
    balances: Mutex<HashMap<UserId, Credits>>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with the given balances.
    pub fn seeded(accounts: impl IntoIterator<Item = (UserId, Credits)>) -> Self {
        Self {
            balances: Mutex::new(accounts.into_iter().collect()),
        }
    }

    /// Create or overwrite an account balance.
    ///
    /// # Errors
    ///
    /// Fails only when a previous holder of the lock panicked.
    pub fn set_balance(&self, user_id: UserId, credits: Credits) -> Result<(), CreditLedgerError> {
        self.lock()?.insert(user_id, credits);
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<UserId, Credits>>, CreditLedgerError> {
        self.balances
            .lock()
            .map_err(|_| CreditLedgerError::query("account store lock poisoned"))
    }
}

#[async_trait]
impl CreditLedger for InMemoryAccountStore {
    async fn balance(&self, user_id: &UserId) -> Result<Option<Credits>, CreditLedgerError> {
        Ok(self.lock()?.get(user_id).copied())
    }

    async fn try_debit(
        &self,
        user_id: &UserId,
        cost: GenerationCost,
    ) -> Result<DebitOutcome, CreditLedgerError> {
        let mut balances = self.lock()?;
        let Some(balance) = balances.get_mut(user_id) else {
            return Ok(DebitOutcome::UnknownAccount);
        };
        Ok(match balance.checked_debit(cost) {
            Some(remaining) => {
                *balance = remaining;
                DebitOutcome::Debited { remaining }
            }
            None => DebitOutcome::Insufficient { balance: *balance },
        })
    }
}
