//! Shared Diesel error mapping for the persistence adapters.
//!
//! Database messages are logged at debug level and replaced with generic
//! text before they reach a port error, so SQL details never leak into API
//! responses.

use tracing::debug;

use super::pool::PoolError;

/// Map pool errors into a port-specific connection error constructor.
pub(crate) fn map_pool_error<E, C>(error: PoolError, connection: C) -> E
where
    C: FnOnce(String) -> E,
{
    let message = match error {
        PoolError::Checkout { message } | PoolError::Build { message } => message,
    };
    connection(message)
}

/// Map Diesel errors into query or connection constructors.
pub(crate) fn map_diesel_error<E, Q, C>(error: diesel::result::Error, query: Q, connection: C) -> E
where
    Q: FnOnce(&'static str) -> E,
    C: FnOnce(&'static str) -> E,
{
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        other => debug!(error = %other, "diesel operation failed"),
    }

    match error {
        DieselError::NotFound => query("record not found"),
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            connection("database connection error")
        }
        DieselError::DatabaseError(DatabaseErrorKind::CheckViolation, _) => {
            query("database constraint rejected the change")
        }
        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
            query("referenced account does not exist")
        }
        _ => query("database error"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::CreditLedgerError;
    use rstest::rstest;

    #[rstest]
    fn not_found_maps_to_query_error() {
        let error: CreditLedgerError = map_diesel_error(
            diesel::result::Error::NotFound,
            CreditLedgerError::query,
            CreditLedgerError::connection,
        );
        assert_eq!(error, CreditLedgerError::query("record not found"));
    }

    #[rstest]
    fn pool_errors_map_to_connection_errors() {
        let error: CreditLedgerError =
            map_pool_error(PoolError::checkout("timed out"), CreditLedgerError::connection);
        assert_eq!(error, CreditLedgerError::connection("timed out"));
    }
}
