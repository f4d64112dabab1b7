//! Credit ledger guard.
//!
//! Enforces the balance precondition before any upstream work and performs
//! the single deduction after a verified result. The pre-check is advisory; the
//! ledger's conditional debit at commit time is what actually prevents a
//! balance from going negative when requests race.

use std::sync::Arc;

use tracing::{debug, warn};

use super::ports::{CreditLedger, CreditLedgerError, DebitOutcome};
use super::{Credits, GenerationCost, UserId};

/// Failures reported by [`CreditLedgerGuard`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerGuardError {
    /// The balance does not cover the cost.
    #[error("insufficient credits: balance {balance}, cost {cost}")]
    Insufficient {
        balance: Credits,
        cost: GenerationCost,
    },
    /// The ledger holds no balance for the user.
    #[error("no credit balance recorded for user {user_id}")]
    UnknownAccount { user_id: UserId },
    /// The ledger itself failed.
    #[error(transparent)]
    Ledger(#[from] CreditLedgerError),
}

/// Proof that a balance covered the cost when it was checked.
///
/// Only [`CreditLedgerGuard::check_and_reserve`] creates one and
/// [`CreditLedgerGuard::commit`] consumes it, so a charge cannot happen
/// without a preceding check or happen twice for one check.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a reservation does nothing until committed"]
pub struct Reservation {
    user_id: UserId,
    observed: Credits,
    cost: GenerationCost,
}

impl Reservation {
    /// Account the reservation belongs to.
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Balance observed during the check.
    pub fn observed_balance(&self) -> Credits {
        self.observed
    }

    /// Amount that commit will deduct.
    pub fn cost(&self) -> GenerationCost {
        self.cost
    }
}

/// Guard wrapping a [`CreditLedger`] with a fixed generation cost.
pub struct CreditLedgerGuard<L: ?Sized> {
    ledger: Arc<L>,
    cost: GenerationCost,
}

impl<L: ?Sized> Clone for CreditLedgerGuard<L> {
    fn clone(&self) -> Self {
        Self {
            ledger: Arc::clone(&self.ledger),
            cost: self.cost,
        }
    }
}

impl<L> CreditLedgerGuard<L>
where
    L: CreditLedger + ?Sized,
{
    pub fn new(ledger: Arc<L>, cost: GenerationCost) -> Self {
        Self { ledger, cost }
    }

    /// Price of one generation.
    pub fn cost(&self) -> GenerationCost {
        self.cost
    }

    /// Verify the balance covers the cost.
    pub async fn check_and_reserve(&self, user_id: &UserId) -> Result<Reservation, LedgerGuardError> {
        let balance = self
            .ledger
            .balance(user_id)
            .await?
            .ok_or_else(|| LedgerGuardError::UnknownAccount {
                user_id: user_id.clone(),
            })?;

        if !balance.covers(self.cost) {
            debug!(%user_id, %balance, cost = %self.cost, "balance below generation cost");
            return Err(LedgerGuardError::Insufficient {
                balance,
                cost: self.cost,
            });
        }

        Ok(Reservation {
            user_id: user_id.clone(),
            observed: balance,
            cost: self.cost,
        })
    }

    /// Deduct the reserved cost and return the new balance.
    ///
    /// Fails with [`LedgerGuardError::Insufficient`] when a concurrent charge
    /// spent the balance after the reservation was taken; nothing is deducted
    /// in that case.
    pub async fn commit(&self, reservation: Reservation) -> Result<Credits, LedgerGuardError> {
        let Reservation {
            user_id,
            observed,
            cost,
        } = reservation;

        match self.ledger.try_debit(&user_id, cost).await? {
            DebitOutcome::Debited { remaining } => {
                debug!(%user_id, %remaining, "credits deducted");
                Ok(remaining)
            }
            DebitOutcome::Insufficient { balance } => {
                warn!(
                    %user_id,
                    observed = %observed,
                    %balance,
                    "balance spent concurrently; charge refused"
                );
                Err(LedgerGuardError::Insufficient { balance, cost })
            }
            DebitOutcome::UnknownAccount => Err(LedgerGuardError::UnknownAccount { user_id }),
        }
    }
}
