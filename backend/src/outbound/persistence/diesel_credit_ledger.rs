//! PostgreSQL-backed `CreditLedger` implementation using Diesel ORM.
//!
//! The debit is a single `UPDATE ... WHERE credits >= cost RETURNING credits`,
//! so the balance check and the write cannot be separated by a concurrent
//! request.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::ports::{CreditLedger, CreditLedgerError, DebitOutcome};
use crate::domain::{Credits, GenerationCost, UserId};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::pool::DbPool;
use super::schema::user_accounts;

/// Diesel-backed implementation of the `CreditLedger` port.
#[derive(Clone)]
pub struct DieselCreditLedger {
    pool: DbPool,
}

impl DieselCreditLedger {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: super::pool::PoolError) -> CreditLedgerError {
    map_pool_error(error, CreditLedgerError::connection)
}

fn diesel_error(error: diesel::result::Error) -> CreditLedgerError {
    map_diesel_error(error, CreditLedgerError::query, CreditLedgerError::connection)
}

fn to_credits(stored: i32) -> Result<Credits, CreditLedgerError> {
    u32::try_from(stored)
        .map(Credits::new)
        .map_err(|_| CreditLedgerError::query(format!("stored balance {stored} is negative")))
}

fn to_db_cost(cost: GenerationCost) -> Result<i32, CreditLedgerError> {
    i32::try_from(cost.value())
        .map_err(|_| CreditLedgerError::query(format!("generation cost {cost} exceeds column range")))
}

impl DieselCreditLedger {
    async fn read_balance(&self, id: Uuid) -> Result<Option<Credits>, CreditLedgerError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let stored: Option<i32> = user_accounts::table
            .find(id)
            .select(user_accounts::credits)
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;
        stored.map(to_credits).transpose()
    }
}

#[async_trait]
impl CreditLedger for DieselCreditLedger {
    async fn balance(&self, user_id: &UserId) -> Result<Option<Credits>, CreditLedgerError> {
        self.read_balance(*user_id.as_uuid()).await
    }

    async fn try_debit(
        &self,
        user_id: &UserId,
        cost: GenerationCost,
    ) -> Result<DebitOutcome, CreditLedgerError> {
        let id = *user_id.as_uuid();
        let amount = to_db_cost(cost)?;
        let remaining: Option<i32> = {
            let mut conn = self.pool.get().await.map_err(pool_error)?;
            diesel::update(
                user_accounts::table
                    .filter(user_accounts::id.eq(id))
                    .filter(user_accounts::credits.ge(amount)),
            )
            .set(user_accounts::credits.eq(user_accounts::credits - amount))
            .returning(user_accounts::credits)
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?
        };

        if let Some(remaining) = remaining {
            return Ok(DebitOutcome::Debited {
                remaining: to_credits(remaining)?,
            });
        }

        // Nothing matched: either the row is missing or the balance is short.
        Ok(match self.read_balance(id).await? {
            Some(balance) => DebitOutcome::Insufficient { balance },
            None => DebitOutcome::UnknownAccount,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, 0)]
    #[case(25, 25)]
    fn stored_balances_convert(#[case] stored: i32, #[case] expected: u32) {
        assert_eq!(to_credits(stored), Ok(Credits::new(expected)));
    }

    #[rstest]
    fn negative_stored_balance_is_a_query_error() {
        assert!(matches!(
            to_credits(-1),
            Err(CreditLedgerError::Query { .. })
        ));
    }

    #[rstest]
    fn oversized_cost_is_rejected() {
        let cost = GenerationCost::new(u32::MAX).expect("non-zero");
        assert!(to_db_cost(cost).is_err());
    }
}
