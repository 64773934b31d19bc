use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;

use super::password::{PasswordError, PasswordHasher};
use super::validation;
use super::{IssuedToken, TokenError, TokenService};
use crate::database::models::{Account, NewAccount, PasswordHash, DEFAULT_STATUS};
use crate::database::store::{Store, StoreError};
use crate::types::Role;

/// Plaintext checked against the dummy hash when no account matches
const TIMING_DUMMY_PASSWORD: &str = "no-such-account-timing-equalizer";

#[derive(Debug, Error)]
pub enum AuthError {
    /// Deliberately identical for unknown identifiers and wrong passwords
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Identifier already registered")]
    DuplicateIdentifier(String),

    #[error("Account not found")]
    NotFound,

    #[error("{message}")]
    Validation { field: &'static str, message: String },

    #[error(transparent)]
    Store(StoreError),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Password(#[from] PasswordError),
}

impl AuthError {
    fn validation(field: &'static str, result: Result<(), String>) -> Result<(), AuthError> {
        result.map_err(|message| AuthError::Validation { field, message })
    }
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation(which) => AuthError::DuplicateIdentifier(which),
            other => AuthError::Store(other),
        }
    }
}

/// Registration input. `role_id` and `status` are only honored when the
/// caller is allowed to choose them; see [`CredentialService::register`].
#[derive(Clone, Deserialize)]
pub struct Registration {
    pub id: String,
    pub student_number: Option<String>,
    pub employee_number: Option<String>,
    pub name: String,
    pub email: Option<String>,
    pub password: String,
    pub role_id: Option<i32>,
    pub department_id: Option<i32>,
    pub program_id: Option<i32>,
    pub year_level: Option<String>,
    pub status: Option<String>,
    pub batch: Option<String>,
    pub photo: Option<String>,
}

impl Registration {
    fn validate(&self) -> Result<(), AuthError> {
        AuthError::validation("id", validation::validate_identifier(&self.id))?;
        if let Some(number) = &self.student_number {
            AuthError::validation("student_number", validation::validate_identifier(number))?;
        }
        if let Some(number) = &self.employee_number {
            AuthError::validation("employee_number", validation::validate_identifier(number))?;
        }
        AuthError::validation("name", validation::validate_name(&self.name))?;
        if let Some(email) = &self.email {
            AuthError::validation("email", validation::validate_email(email))?;
        }
        AuthError::validation("password", validation::validate_password(&self.password))?;
        if let Some(role_id) = self.role_id {
            if Role::from_id(role_id).is_none() {
                return Err(AuthError::Validation {
                    field: "role_id",
                    message: format!("Unknown role id {}", role_id),
                });
            }
        }
        Ok(())
    }
}

/// Verifies credentials, registers accounts and issues session tokens
#[derive(Clone)]
pub struct CredentialService {
    store: Arc<dyn Store>,
    tokens: TokenService,
    hasher: PasswordHasher,
    dummy_hash: PasswordHash,
}

impl CredentialService {
    pub async fn new(
        store: Arc<dyn Store>,
        tokens: TokenService,
        hasher: PasswordHasher,
    ) -> Result<Self, PasswordError> {
        let dummy_hash = hasher.hash(TIMING_DUMMY_PASSWORD).await?;
        Ok(Self {
            store,
            tokens,
            hasher,
            dummy_hash,
        })
    }

    /// Checks `identifier`/`password` and returns a signed token.
    ///
    /// Unknown identifiers still pay for one bcrypt verification, and both
    /// failure modes return [`AuthError::InvalidCredentials`].
    pub async fn authenticate(&self, identifier: &str, password: &str) -> Result<IssuedToken, AuthError> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Err(AuthError::Validation {
                field: "identifier",
                message: "Identifier is required".to_string(),
            });
        }
        if password.is_empty() {
            return Err(AuthError::Validation {
                field: "password",
                message: "Password is required".to_string(),
            });
        }

        let account = self.store.find_by_identifier(identifier).await?;
        let hash = account
            .as_ref()
            .map(|a| &a.password_hash)
            .unwrap_or(&self.dummy_hash);
        let verified = self.hasher.verify(password, hash).await?;

        match account {
            Some(account) if verified => {
                let issued = self.tokens.issue(&account.id, account.role_id)?;
                tracing::info!("Login succeeded for account '{}' (role {})", account.id, account.role_id);
                Ok(issued)
            }
            _ => {
                tracing::warn!("Login failed for identifier '{}'", identifier);
                Err(AuthError::InvalidCredentials)
            }
        }
    }

    /// Hashes the password and inserts the account. Without a role in the
    /// registration, `default_role` applies.
    pub async fn register(&self, registration: Registration, default_role: Role) -> Result<Account, AuthError> {
        registration.validate()?;

        let password_hash = self.hasher.hash(&registration.password).await?;
        let new_account = NewAccount {
            id: registration.id,
            student_number: registration.student_number,
            employee_number: registration.employee_number,
            name: registration.name.trim().to_string(),
            email: registration.email,
            password_hash,
            role_id: registration.role_id.unwrap_or(default_role.id()),
            department_id: registration.department_id,
            program_id: registration.program_id,
            year_level: registration.year_level,
            status: registration.status.unwrap_or_else(|| DEFAULT_STATUS.to_string()),
            batch: registration.batch,
            photo: registration.photo,
        };

        let account = self.store.insert_account(new_account).await.map_err(|e| {
            if let StoreError::UniqueViolation(which) = &e {
                tracing::warn!("Registration rejected, identifier in use ({})", which);
            }
            AuthError::from(e)
        })?;

        tracing::info!("Registered account '{}' with role {}", account.id, account.role_id);
        Ok(account)
    }

    /// Re-hashes the password after verifying the current one
    pub async fn change_password(&self, account_id: &str, current: &str, new: &str) -> Result<(), AuthError> {
        AuthError::validation("new_password", validation::validate_password(new))?;

        let account = self
            .store
            .find_by_id(account_id)
            .await?
            .ok_or(AuthError::NotFound)?;

        if !self.hasher.verify(current, &account.password_hash).await? {
            tracing::warn!("Password change rejected for account '{}'", account_id);
            return Err(AuthError::InvalidCredentials);
        }

        let hash = self.hasher.hash(new).await?;
        if !self.store.set_password_hash(account_id, &hash).await? {
            return Err(AuthError::NotFound);
        }

        tracing::info!("Password changed for account '{}'", account_id);
        Ok(())
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }
}
