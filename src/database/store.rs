use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::Serialize;
use thiserror::Error;

use crate::database::models::{Account, AccountUpdate, HistoryEntry, HistoryRecord, NewAccount, PasswordHash};

/// Errors raised by store adapters
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("Timed out waiting for a database connection")]
    PoolExhausted,

    /// A department, program or role id that does not exist. Holds the
    /// offending column name.
    #[error("Unknown reference in {0}")]
    InvalidReference(String),

    #[error(transparent)]
    Sqlx(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut => StoreError::PoolExhausted,
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::UniqueViolation(db.constraint().unwrap_or("identifier").to_string())
            }
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                StoreError::InvalidReference(reference_column(db.constraint()))
            }
            other => StoreError::Sqlx(other),
        }
    }
}

/// Column behind a default-named foreign key, e.g. `accounts_program_id_fkey`
fn reference_column(constraint: Option<&str>) -> String {
    constraint
        .map(|c| c.trim_start_matches("accounts_").trim_end_matches("_fkey"))
        .filter(|c| !c.is_empty())
        .unwrap_or("reference")
        .to_string()
}

/// Result of an account update: the new row plus the history it produced
#[derive(Debug, Clone, Serialize)]
pub struct AccountUpdateOutcome {
    pub account: Account,
    pub history: Option<HistoryRecord>,
}

#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Round-trip to the backing store
    async fn ping(&self) -> Result<(), StoreError>;

    /// Match against the primary id, student number or employee number
    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<Account>, StoreError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Account>, StoreError>;

    /// Fails with [`StoreError::UniqueViolation`] when any identifier is
    /// taken, and [`StoreError::InvalidReference`] for an unknown
    /// department, program or role
    async fn insert_account(&self, account: NewAccount) -> Result<Account, StoreError>;

    /// Applies `update` under a row lock. When tracked fields change, the
    /// history record is written in the same transaction. `None` if the
    /// account does not exist. Unknown department, program or role ids
    /// fail with [`StoreError::InvalidReference`] and change nothing.
    async fn update_account(
        &self,
        id: &str,
        actor_id: &str,
        update: &AccountUpdate,
    ) -> Result<Option<AccountUpdateOutcome>, StoreError>;

    /// Returns false when the account does not exist
    async fn set_password_hash(&self, id: &str, hash: &PasswordHash) -> Result<bool, StoreError>;

    /// Administrative hard delete; not audited
    async fn delete_account(&self, id: &str) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// All records for one account, most recent first
    async fn list_history(&self, account_id: &str) -> Result<Vec<HistoryEntry>, StoreError>;

    /// Every record across all accounts as a cursor, oldest first
    fn export_history(&self) -> BoxStream<'_, Result<HistoryEntry, StoreError>>;
}

/// Full store collaborator used by the services and handlers
pub trait Store: AccountStore + HistoryStore {}

impl<T: AccountStore + HistoryStore> Store for T {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn foreign_key_names_map_to_columns() {
        assert_eq!(reference_column(Some("accounts_department_id_fkey")), "department_id");
        assert_eq!(reference_column(Some("accounts_program_id_fkey")), "program_id");
        assert_eq!(reference_column(None), "reference");
    }

    #[test]
    fn pool_timeout_is_exhaustion() {
        assert!(matches!(StoreError::from(sqlx::Error::PoolTimedOut), StoreError::PoolExhausted));
        assert!(matches!(StoreError::from(sqlx::Error::RowNotFound), StoreError::Sqlx(_)));
    }
}
