use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;
use tracing::info;

use crate::config::{AppConfig, ConfigError};

/// Errors from DatabaseManager
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Builds the process-wide connection pool. The pool is the only shared
/// store resource; callers acquire and release through it, never holding
/// raw connections.
pub struct DatabaseManager;

impl DatabaseManager {
    /// Connect a bounded pool: at most `max_connections` live connections,
    /// and acquiring waits no longer than `acquire_timeout_secs`.
    pub async fn connect(config: &AppConfig) -> Result<PgPool, DatabaseError> {
        let url = config.database_url()?;
        let redacted = Self::redact_url(url)?;

        let pool = PgPoolOptions::new()
            .max_connections(config.database.max_connections)
            .acquire_timeout(Duration::from_secs(config.database.acquire_timeout_secs))
            .connect(url)
            .await?;

        info!(
            "Connected database pool to {} (max {} connections, {}s acquire timeout)",
            redacted, config.database.max_connections, config.database.acquire_timeout_secs
        );
        Ok(pool)
    }

    /// Connection string with any password replaced, safe for logs
    fn redact_url(url: &str) -> Result<String, DatabaseError> {
        let mut parsed = url::Url::parse(url).map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        if parsed.password().is_some() {
            parsed
                .set_password(Some("****"))
                .map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        }
        Ok(parsed.into())
    }
}
