use std::sync::Arc;

use thiserror::Error;

use crate::auth::{CredentialService, PasswordError, PasswordHasher, TokenError, TokenService};
use crate::config::AppConfig;
use crate::database::store::Store;

#[derive(Debug, Error)]
pub enum StateError {
    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Password(#[from] PasswordError),
}

/// Shared handler state. Cheap to clone; everything heavy sits behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn Store>,
    pub tokens: TokenService,
    pub credentials: CredentialService,
}

impl AppState {
    pub async fn new(config: AppConfig, store: Arc<dyn Store>) -> Result<Self, StateError> {
        let tokens = TokenService::from_config(&config.security)?;
        let hasher = PasswordHasher::new(config.security.bcrypt_cost);
        let credentials = CredentialService::new(store.clone(), tokens.clone(), hasher).await?;

        Ok(Self {
            config: Arc::new(config),
            store,
            tokens,
            credentials,
        })
    }
}
