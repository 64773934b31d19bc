use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

/// Secret used when running in development without JWT_SECRET
const DEVELOPMENT_JWT_SECRET: &str = "development-only-secret-do-not-deploy";

/// Lowest bcrypt cost accepted for stored password hashes
pub const MIN_BCRYPT_COST: u32 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub enable_request_logging: bool,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub token_ttl_secs: i64,
    pub bcrypt_cost: u32,
    pub allow_self_registration: bool,
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()?
        .validated()
    }

    fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v);
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = parse("DATABASE_MAX_CONNECTIONS", &v)?;
        }
        if let Ok(v) = env::var("DATABASE_ACQUIRE_TIMEOUT_SECS") {
            self.database.acquire_timeout_secs = parse("DATABASE_ACQUIRE_TIMEOUT_SECS", &v)?;
        }

        // API overrides
        if let Ok(v) = env::var("API_PORT").or_else(|_| env::var("PORT")) {
            self.api.port = parse("API_PORT", &v)?;
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = parse("API_ENABLE_REQUEST_LOGGING", &v)?;
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = parse("API_MAX_REQUEST_SIZE_BYTES", &v)?;
        }

        // Security overrides
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SECURITY_TOKEN_TTL_SECS") {
            self.security.token_ttl_secs = parse("SECURITY_TOKEN_TTL_SECS", &v)?;
        }
        if let Ok(v) = env::var("SECURITY_BCRYPT_COST") {
            self.security.bcrypt_cost = parse("SECURITY_BCRYPT_COST", &v)?;
        }
        if let Ok(v) = env::var("SECURITY_ALLOW_SELF_REGISTRATION") {
            self.security.allow_self_registration = parse("SECURITY_ALLOW_SELF_REGISTRATION", &v)?;
        }
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = parse("SECURITY_ENABLE_CORS", &v)?;
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }

        Ok(self)
    }

    fn validated(mut self) -> Result<Self, ConfigError> {
        if self.security.jwt_secret.is_empty() {
            if self.environment != Environment::Development {
                return Err(ConfigError::Missing("JWT_SECRET"));
            }
            tracing::warn!("JWT_SECRET not set; using the built-in development secret");
            self.security.jwt_secret = DEVELOPMENT_JWT_SECRET.to_string();
        }

        if self.security.token_ttl_secs <= 0 {
            return Err(ConfigError::Invalid {
                name: "SECURITY_TOKEN_TTL_SECS",
                value: self.security.token_ttl_secs.to_string(),
            });
        }

        if self.security.bcrypt_cost < MIN_BCRYPT_COST {
            tracing::warn!(
                "bcrypt cost {} below minimum, raising to {}",
                self.security.bcrypt_cost,
                MIN_BCRYPT_COST
            );
            self.security.bcrypt_cost = MIN_BCRYPT_COST;
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid {
                name: "DATABASE_MAX_CONNECTIONS",
                value: "0".to_string(),
            });
        }

        Ok(self)
    }

    /// DATABASE_URL is optional for the config itself but required to open a pool
    pub fn database_url(&self) -> Result<&str, ConfigError> {
        self.database
            .url
            .as_deref()
            .ok_or(ConfigError::Missing("DATABASE_URL"))
    }

    pub fn is_production(&self) -> bool {
        matches!(self.environment, Environment::Production)
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                acquire_timeout_secs: 30,
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: true,
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                token_ttl_secs: 3600,
                bcrypt_cost: MIN_BCRYPT_COST,
                allow_self_registration: true,
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                acquire_timeout_secs: 10,
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: true,
                max_request_size_bytes: 5 * 1024 * 1024, // 5MB
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                token_ttl_secs: 3600,
                bcrypt_cost: 11,
                allow_self_registration: false,
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                acquire_timeout_secs: 5,
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: false,
                max_request_size_bytes: 2 * 1024 * 1024, // 2MB
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                token_ttl_secs: 3600,
                bcrypt_cost: 12,
                allow_self_registration: false,
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
            },
        }
    }
}

fn parse<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        name,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.security.token_ttl_secs, 3600);
        assert!(config.security.allow_self_registration);
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert!(!config.security.allow_self_registration);
        assert!(config.security.bcrypt_cost >= MIN_BCRYPT_COST);
        assert!(config.is_production());
    }

    #[test]
    fn development_falls_back_to_builtin_secret() {
        let config = AppConfig::development().validated().unwrap();
        assert_eq!(config.security.jwt_secret, DEVELOPMENT_JWT_SECRET);
    }

    #[test]
    fn production_requires_secret() {
        let err = AppConfig::production().validated().unwrap_err();
        assert!(matches!(err, ConfigError::Missing("JWT_SECRET")));
    }

    #[test]
    fn low_bcrypt_cost_is_raised() {
        let mut config = AppConfig::development();
        config.security.bcrypt_cost = 4;
        let config = config.validated().unwrap();
        assert_eq!(config.security.bcrypt_cost, MIN_BCRYPT_COST);
    }

    #[test]
    fn boolean_overrides_are_strict() {
        env::set_var("SECURITY_ALLOW_SELF_REGISTRATION", "yes");
        let result = AppConfig::production().with_env_overrides();
        env::set_var("SECURITY_ALLOW_SELF_REGISTRATION", "true");
        let enabled = AppConfig::production().with_env_overrides();
        env::remove_var("SECURITY_ALLOW_SELF_REGISTRATION");

        assert!(matches!(
            result,
            Err(ConfigError::Invalid { name: "SECURITY_ALLOW_SELF_REGISTRATION", .. })
        ));
        assert!(enabled.unwrap().security.allow_self_registration);
        assert!(parse::<bool>("SECURITY_ENABLE_CORS", " false ").is_ok());
    }

    #[test]
    fn missing_database_url_is_reported() {
        let config = AppConfig::development();
        assert!(matches!(config.database_url(), Err(ConfigError::Missing("DATABASE_URL"))));
    }
}
