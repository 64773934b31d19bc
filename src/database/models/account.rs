use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::history::TrackedFields;

pub const DEFAULT_STATUS: &str = "active";

/// Stored bcrypt hash. Never serialized, redacted from Debug output.
#[derive(Clone, PartialEq, Eq, sqlx::Type)]
#[sqlx(transparent)]
pub struct PasswordHash(String);

impl PasswordHash {
    pub fn new(hash: String) -> Self {
        Self(hash)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PasswordHash([redacted])")
    }
}

/// Any authenticable principal: student, employee or administrative user
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Account {
    pub id: String,
    pub student_number: Option<String>,
    pub employee_number: Option<String>,
    pub name: String,
    pub email: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: PasswordHash,
    pub role_id: i32,
    pub department_id: Option<i32>,
    pub program_id: Option<i32>,
    pub year_level: Option<String>,
    pub status: String,
    pub batch: Option<String>,
    pub photo: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub fn tracked(&self) -> TrackedFields {
        TrackedFields {
            department_id: self.department_id,
            program_id: self.program_id,
            year_level: self.year_level.clone(),
            status: self.status.clone(),
            batch: self.batch.clone(),
            role_id: self.role_id,
        }
    }

    /// True when `identifier` names this account through any identifier column
    pub fn matches_identifier(&self, identifier: &str) -> bool {
        self.id == identifier
            || self.student_number.as_deref() == Some(identifier)
            || self.employee_number.as_deref() == Some(identifier)
    }
}

/// Row to insert at registration; the password is already hashed
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub id: String,
    pub student_number: Option<String>,
    pub employee_number: Option<String>,
    pub name: String,
    pub email: Option<String>,
    pub password_hash: PasswordHash,
    pub role_id: i32,
    pub department_id: Option<i32>,
    pub program_id: Option<i32>,
    pub year_level: Option<String>,
    pub status: String,
    pub batch: Option<String>,
    pub photo: Option<String>,
}

impl NewAccount {
    pub fn into_account(self, now: DateTime<Utc>) -> Account {
        Account {
            id: self.id,
            student_number: self.student_number,
            employee_number: self.employee_number,
            name: self.name,
            email: self.email,
            password_hash: self.password_hash,
            role_id: self.role_id,
            department_id: self.department_id,
            program_id: self.program_id,
            year_level: self.year_level,
            status: self.status,
            batch: self.batch,
            photo: self.photo,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial profile update. `None` leaves a column untouched.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccountUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub photo: Option<String>,
    pub department_id: Option<i32>,
    pub program_id: Option<i32>,
    pub year_level: Option<String>,
    pub status: Option<String>,
    pub batch: Option<String>,
    pub role_id: Option<i32>,
}

impl AccountUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn changes_role(&self) -> bool {
        self.role_id.is_some()
    }

    pub fn apply_to(&self, account: &mut Account) {
        if let Some(name) = &self.name {
            account.name = name.clone();
        }
        if let Some(email) = &self.email {
            account.email = Some(email.clone());
        }
        if let Some(photo) = &self.photo {
            account.photo = Some(photo.clone());
        }
        if let Some(department_id) = self.department_id {
            account.department_id = Some(department_id);
        }
        if let Some(program_id) = self.program_id {
            account.program_id = Some(program_id);
        }
        if let Some(year_level) = &self.year_level {
            account.year_level = Some(year_level.clone());
        }
        if let Some(status) = &self.status {
            account.status = status.clone();
        }
        if let Some(batch) = &self.batch {
            account.batch = Some(batch.clone());
        }
        if let Some(role_id) = self.role_id {
            account.role_id = role_id;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account() -> Account {
        NewAccount {
            id: "S001".to_string(),
            student_number: Some("2024-0001".to_string()),
            employee_number: None,
            name: "Ana Cruz".to_string(),
            email: None,
            password_hash: PasswordHash::new("$2b$10$hash".to_string()),
            role_id: 3,
            department_id: Some(1),
            program_id: None,
            year_level: Some("1".to_string()),
            status: DEFAULT_STATUS.to_string(),
            batch: None,
            photo: None,
        }
        .into_account(Utc::now())
    }

    #[test]
    fn password_hash_is_hidden() {
        let account = account();
        let json = serde_json::to_value(&account).unwrap();
        assert!(json.get("password_hash").is_none());
        assert!(!format!("{:?}", account).contains("$2b$"));
    }

    #[test]
    fn matches_any_identifier_column() {
        let account = account();
        assert!(account.matches_identifier("S001"));
        assert!(account.matches_identifier("2024-0001"));
        assert!(!account.matches_identifier("E001"));
    }

    #[test]
    fn update_touches_only_given_fields() {
        let mut account = account();
        let update = AccountUpdate {
            department_id: Some(2),
            email: Some("ana@campus.edu".to_string()),
            ..Default::default()
        };
        update.apply_to(&mut account);
        assert_eq!(account.department_id, Some(2));
        assert_eq!(account.email.as_deref(), Some("ana@campus.edu"));
        assert_eq!(account.year_level.as_deref(), Some("1"));
        assert_eq!(account.role_id, 3);
        assert!(!update.changes_role());
        assert!(AccountUpdate::default().is_empty());
    }
}
