use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{Duration, SubsecRound, Utc};
use futures::stream::{self, BoxStream, StreamExt};
use tokio::sync::RwLock;

use crate::database::models::{Account, AccountUpdate, HistoryEntry, HistoryRecord, NewAccount, PasswordHash};
use crate::database::store::{AccountStore, AccountUpdateOutcome, HistoryStore, StoreError};
use crate::history;
use crate::types::Role;

#[derive(Default)]
struct MemoryState {
    accounts: HashMap<String, Account>,
    history: Vec<HistoryRecord>,
    departments: HashMap<i32, String>,
    programs: HashMap<i32, String>,
    roles: HashMap<i32, String>,
}

impl MemoryState {
    fn identifier_taken(&self, identifier: &str) -> bool {
        self.accounts.values().any(|a| a.matches_identifier(identifier))
    }

    /// Same checks the Postgres foreign keys make on accounts
    fn check_references(
        &self,
        department_id: Option<i32>,
        program_id: Option<i32>,
        role_id: i32,
    ) -> Result<(), StoreError> {
        if department_id.is_some_and(|id| !self.departments.contains_key(&id)) {
            return Err(StoreError::InvalidReference("department_id".to_string()));
        }
        if program_id.is_some_and(|id| !self.programs.contains_key(&id)) {
            return Err(StoreError::InvalidReference("program_id".to_string()));
        }
        if !self.roles.contains_key(&role_id) {
            return Err(StoreError::InvalidReference("role_id".to_string()));
        }
        Ok(())
    }

    fn entry(&self, record: &HistoryRecord) -> HistoryEntry {
        let department = |id: Option<i32>| id.and_then(|id| self.departments.get(&id).cloned());
        let program = |id: Option<i32>| id.and_then(|id| self.programs.get(&id).cloned());
        let account_name = |id: &str| self.accounts.get(id).map(|a| a.name.clone());

        HistoryEntry {
            account_name: account_name(&record.account_id),
            updated_by_name: account_name(&record.updated_by),
            old_department_name: department(record.old_department_id),
            new_department_name: department(record.new_department_id),
            old_program_name: program(record.old_program_id),
            new_program_name: program(record.new_program_id),
            old_role_name: self.roles.get(&record.old_role_id).cloned(),
            new_role_name: self.roles.get(&record.new_role_id).cloned(),
            record: record.clone(),
        }
    }
}

/// In-process store with the same semantics as the Postgres adapter.
/// One write lock covers each account update and its history record.
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Empty store with the standard roles registered
    pub fn new() -> Self {
        let roles = [Role::Administrator, Role::Staff, Role::Student]
            .into_iter()
            .map(|r| (r.id(), r.label().to_string()))
            .collect();

        Self {
            state: RwLock::new(MemoryState {
                roles,
                ..Default::default()
            }),
        }
    }

    pub fn with_department(mut self, id: i32, name: &str) -> Self {
        self.state.get_mut().departments.insert(id, name.to_string());
        self
    }

    pub fn with_program(mut self, id: i32, name: &str) -> Self {
        self.state.get_mut().programs.insert(id, name.to_string());
        self
    }

    /// Number of stored history records across all accounts
    pub async fn history_len(&self) -> usize {
        self.state.read().await.history.len()
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<Account>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .accounts
            .values()
            .find(|a| a.matches_identifier(identifier))
            .cloned())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Account>, StoreError> {
        Ok(self.state.read().await.accounts.get(id).cloned())
    }

    async fn insert_account(&self, account: NewAccount) -> Result<Account, StoreError> {
        let mut state = self.state.write().await;

        let identifiers = [
            Some(account.id.as_str()),
            account.student_number.as_deref(),
            account.employee_number.as_deref(),
        ];
        if let Some(taken) = identifiers.into_iter().flatten().find(|i| state.identifier_taken(i)) {
            return Err(StoreError::UniqueViolation(taken.to_string()));
        }
        state.check_references(account.department_id, account.program_id, account.role_id)?;

        let account = account.into_account(Utc::now());
        state.accounts.insert(account.id.clone(), account.clone());
        Ok(account)
    }

    async fn update_account(
        &self,
        id: &str,
        actor_id: &str,
        update: &AccountUpdate,
    ) -> Result<Option<AccountUpdateOutcome>, StoreError> {
        let mut state = self.state.write().await;

        let Some(current) = state.accounts.get(id) else {
            return Ok(None);
        };

        let before = current.tracked();
        let mut account = current.clone();
        update.apply_to(&mut account);
        state.check_references(account.department_id, account.program_id, account.role_id)?;

        // Keep per-account timestamps strictly increasing, at the
        // microsecond precision Postgres stores
        let mut now = Utc::now().trunc_subsecs(6);
        if let Some(last) = state
            .history
            .iter()
            .filter(|r| r.account_id == id)
            .map(|r| r.changed_at)
            .max()
        {
            if now <= last {
                now = last + Duration::microseconds(1);
            }
        }
        account.updated_at = now;

        let history = history::record_transition(id, actor_id, &before, &account.tracked(), now);
        if let Some(record) = &history {
            state.history.push(record.clone());
        }
        state.accounts.insert(id.to_string(), account.clone());

        Ok(Some(AccountUpdateOutcome { account, history }))
    }

    async fn set_password_hash(&self, id: &str, hash: &PasswordHash) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;
        match state.accounts.get_mut(id) {
            Some(account) => {
                account.password_hash = hash.clone();
                account.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_account(&self, id: &str) -> Result<bool, StoreError> {
        // History rows stay behind; their account labels resolve to nothing
        Ok(self.state.write().await.accounts.remove(id).is_some())
    }
}

#[async_trait]
impl HistoryStore for MemoryStore {
    async fn list_history(&self, account_id: &str) -> Result<Vec<HistoryEntry>, StoreError> {
        let state = self.state.read().await;
        let mut entries: Vec<HistoryEntry> = state
            .history
            .iter()
            .filter(|r| r.account_id == account_id)
            .map(|r| state.entry(r))
            .collect();
        entries.sort_by(|a, b| b.record.changed_at.cmp(&a.record.changed_at));
        Ok(entries)
    }

    fn export_history(&self) -> BoxStream<'_, Result<HistoryEntry, StoreError>> {
        stream::once(async move {
            let state = self.state.read().await;
            let mut entries: Vec<HistoryEntry> = state.history.iter().map(|r| state.entry(r)).collect();
            entries.sort_by(|a, b| a.record.changed_at.cmp(&b.record.changed_at));
            stream::iter(entries.into_iter().map(Ok::<_, StoreError>))
        })
        .flatten()
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_account;

    #[tokio::test]
    async fn duplicate_identifiers_are_rejected() {
        let store = MemoryStore::new();
        let mut first = sample_account("S001", "hash");
        first.student_number = Some("2024-0001".to_string());
        store.insert_account(first).await.unwrap();

        let err = store.insert_account(sample_account("S001", "hash")).await.unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation(_)));

        let mut clash = sample_account("S002", "hash");
        clash.student_number = Some("2024-0001".to_string());
        let err = store.insert_account(clash).await.unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation(id) if id == "2024-0001"));
    }

    #[tokio::test]
    async fn untracked_update_writes_no_history() {
        let store = MemoryStore::new();
        store.insert_account(sample_account("S001", "hash")).await.unwrap();

        let update = AccountUpdate {
            email: Some("s001@campus.edu".to_string()),
            ..Default::default()
        };
        let outcome = store.update_account("S001", "A001", &update).await.unwrap().unwrap();
        assert!(outcome.history.is_none());
        assert_eq!(outcome.account.email.as_deref(), Some("s001@campus.edu"));
        assert_eq!(store.history_len().await, 0);
    }

    #[tokio::test]
    async fn history_lists_newest_first_with_labels() {
        let store = MemoryStore::new()
            .with_department(1, "Engineering")
            .with_department(2, "Nursing");
        store.insert_account(sample_account("S001", "hash")).await.unwrap();

        for department_id in [1, 2, 1] {
            let update = AccountUpdate {
                department_id: Some(department_id),
                ..Default::default()
            };
            store.update_account("S001", "A001", &update).await.unwrap();
        }

        let entries = store.list_history("S001").await.unwrap();
        assert_eq!(entries.len(), 3);
        assert!(entries
            .windows(2)
            .all(|w| w[0].record.changed_at > w[1].record.changed_at));
        assert_eq!(entries[0].old_department_name.as_deref(), Some("Nursing"));
        assert_eq!(entries[0].new_department_name.as_deref(), Some("Engineering"));
        assert_eq!(entries[2].old_department_name, None);
        assert_eq!(entries[0].old_role_name.as_deref(), Some("Student"));
    }

    #[tokio::test]
    async fn unknown_references_are_rejected_without_history() {
        let store = MemoryStore::new().with_department(1, "Engineering");
        let mut account = sample_account("S001", "hash");
        account.program_id = Some(77);
        let err = store.insert_account(account).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidReference(col) if col == "program_id"));

        store.insert_account(sample_account("S001", "hash")).await.unwrap();
        let update = AccountUpdate {
            department_id: Some(999),
            status: Some("inactive".to_string()),
            ..Default::default()
        };
        let err = store.update_account("S001", "A001", &update).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidReference(col) if col == "department_id"));

        let account = store.find_by_id("S001").await.unwrap().unwrap();
        assert_eq!(account.department_id, None);
        assert_eq!(account.status, "active");
        assert_eq!(store.history_len().await, 0);
    }

    #[tokio::test]
    async fn update_of_missing_account_is_none() {
        let store = MemoryStore::new();
        let update = AccountUpdate {
            status: Some("inactive".to_string()),
            ..Default::default()
        };
        assert!(store.update_account("nobody", "A001", &update).await.unwrap().is_none());
        assert_eq!(store.history_len().await, 0);
    }
}
