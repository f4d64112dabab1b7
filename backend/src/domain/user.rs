//! Account identity and credit balance.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Validation errors returned when constructing a [`UserId`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserValidationError {
    #[error("user id must not be empty")]
    EmptyId,
    #[error("user id must be a valid UUID")]
    InvalidId,
}

/// Stable user identifier stored as a UUID.
///
/// The original textual form is retained so it round-trips unchanged through
/// logs and JSON payloads.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(Uuid, String);

impl UserId {
    /// Validate and construct a [`UserId`] from borrowed input.
    ///
    /// # Examples
    /// ```
    /// use headshot_backend::domain::UserId;
    ///
    /// let id = UserId::new("3fa85f64-5717-4562-b3fc-2c963f66afa6").expect("valid id");
    /// assert_eq!(id.as_ref(), "3fa85f64-5717-4562-b3fc-2c963f66afa6");
    /// ```
    pub fn new(id: impl AsRef<str>) -> Result<Self, UserValidationError> {
        Self::from_owned(id.as_ref().to_owned())
    }

    /// Generate a new random [`UserId`].
    pub fn random() -> Self {
        Self::from_uuid(Uuid::new_v4())
    }

    /// Wrap an existing UUID, e.g. one read back from the database.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid, uuid.to_string())
    }

    fn from_owned(id: String) -> Result<Self, UserValidationError> {
        if id.is_empty() {
            return Err(UserValidationError::EmptyId);
        }
        if id.trim() != id {
            return Err(UserValidationError::InvalidId);
        }

        let parsed = Uuid::parse_str(&id).map_err(|_| UserValidationError::InvalidId)?;
        Ok(Self(parsed, id))
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        self.1.as_str()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        let UserId(_, raw) = value;
        raw
    }
}

impl TryFrom<String> for UserId {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

/// Non-negative credit balance.
///
/// Balances only ever shrink through [`Credits::checked_debit`], which refuses
/// to go below zero.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
    ToSchema,
)]
#[serde(transparent)]
#[schema(value_type = u32, example = 30)]
pub struct Credits(u32);

impl Credits {
    /// Wrap a raw balance.
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Raw balance value.
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Whether this balance can pay for one generation.
    pub const fn covers(self, cost: GenerationCost) -> bool {
        self.0 >= cost.value()
    }

    /// Subtract the cost, or `None` when the balance would go negative.
    ///
    /// # Examples
    /// ```
    /// use headshot_backend::domain::{Credits, GenerationCost};
    ///
    /// let cost = GenerationCost::default();
    /// assert_eq!(Credits::new(30).checked_debit(cost), Some(Credits::new(5)));
    /// assert_eq!(Credits::new(10).checked_debit(cost), None);
    /// ```
    pub fn checked_debit(self, cost: GenerationCost) -> Option<Self> {
        self.0.checked_sub(cost.value()).map(Self)
    }
}

impl fmt::Display for Credits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Default price of one generation, in credits.
pub const DEFAULT_GENERATION_COST: u32 = 25;

/// Fixed price charged for each successful generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GenerationCost(u32);

/// Returned when a configured cost is zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("generation cost must be greater than zero")]
pub struct ZeroGenerationCost;

impl GenerationCost {
    /// Validate a configured cost.
    pub fn new(value: u32) -> Result<Self, ZeroGenerationCost> {
        if value == 0 {
            return Err(ZeroGenerationCost);
        }
        Ok(Self(value))
    }

    /// Raw cost value.
    pub const fn value(self) -> u32 {
        self.0
    }
}

impl Default for GenerationCost {
    fn default() -> Self {
        Self(DEFAULT_GENERATION_COST)
    }
}

impl fmt::Display for GenerationCost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A user as seen by the gateway: identity plus current balance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAccount {
    pub id: UserId,
    pub credits: Credits,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", UserValidationError::EmptyId)]
    #[case("not-a-uuid", UserValidationError::InvalidId)]
    #[case(" 3fa85f64-5717-4562-b3fc-2c963f66afa6", UserValidationError::InvalidId)]
    fn rejects_malformed_ids(#[case] raw: &str, #[case] expected: UserValidationError) {
        assert_eq!(UserId::new(raw).expect_err("invalid id"), expected);
    }

    #[test]
    fn user_id_serialises_as_plain_string() {
        let id = UserId::new("3fa85f64-5717-4562-b3fc-2c963f66afa6").expect("valid id");
        let json = serde_json::to_string(&id).expect("serialise");
        assert_eq!(json, "\"3fa85f64-5717-4562-b3fc-2c963f66afa6\"");
    }

    #[rstest]
    #[case(25, true)]
    #[case(24, false)]
    #[case(0, false)]
    #[case(1_000, true)]
    fn covers_compares_against_cost(#[case] balance: u32, #[case] expected: bool) {
        assert_eq!(Credits::new(balance).covers(GenerationCost::default()), expected);
    }

    #[test]
    fn debit_of_exact_balance_reaches_zero() {
        let cost = GenerationCost::new(25).expect("non-zero cost");
        assert_eq!(Credits::new(25).checked_debit(cost), Some(Credits::new(0)));
    }

    #[test]
    fn zero_cost_is_rejected() {
        assert_eq!(GenerationCost::new(0), Err(ZeroGenerationCost));
    }
}
