//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. Regenerate with
//! `diesel print-schema` after changing a migration.

diesel::table! {
    /// Credit balances, one row per account.
    ///
    /// A check constraint keeps `credits` non-negative.
    user_accounts (id) {
        id -> Uuid,
        credits -> Int4,
        created_at -> Timestamptz,
        /// Maintained by a trigger.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Append-only record of completed generations.
    generation_history (id) {
        id -> Uuid,
        owner_id -> Uuid,
        source_reference -> Text,
        result_reference -> Text,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(generation_history -> user_accounts (owner_id));

diesel::allow_tables_to_appear_in_same_query!(user_accounts, generation_history);
