pub mod credentials;
pub mod password;
pub mod validation;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::config::SecurityConfig;

pub use credentials::{AuthError, CredentialService, Registration};
pub use password::{PasswordError, PasswordHasher};

/// Minimal claim set carried by a session token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role_id: i32,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("No token provided")]
    Missing,

    #[error("Token expired")]
    Expired,

    #[error("Invalid token: {0}")]
    Invalid(String),

    #[error("Token generation error: {0}")]
    Signing(String),

    #[error("Token secret not configured")]
    InvalidSecret,
}

/// A freshly signed token plus what the client needs to use it
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub token: String,
    pub role_id: i32,
    pub expires_in: i64,
    pub expires_at: DateTime<Utc>,
}

/// Issues and validates HS256 session tokens. Stateless: nothing is
/// persisted, and a token stays valid until it expires.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, ttl_secs: i64) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::InvalidSecret);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl: Duration::seconds(ttl_secs),
        })
    }

    pub fn from_config(security: &SecurityConfig) -> Result<Self, TokenError> {
        Self::new(&security.jwt_secret, security.token_ttl_secs)
    }

    pub fn ttl_secs(&self) -> i64 {
        self.ttl.num_seconds()
    }

    pub fn issue(&self, subject: &str, role_id: i32) -> Result<IssuedToken, TokenError> {
        self.issue_at(subject, role_id, Utc::now())
    }

    /// Signs a token as if issued at `issued_at`
    pub fn issue_at(
        &self,
        subject: &str,
        role_id: i32,
        issued_at: DateTime<Utc>,
    ) -> Result<IssuedToken, TokenError> {
        let expires_at = issued_at + self.ttl;
        let claims = Claims {
            sub: subject.to_string(),
            role_id,
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))?;

        Ok(IssuedToken {
            token,
            role_id,
            expires_in: self.ttl_secs(),
            expires_at,
        })
    }

    /// Verifies signature and expiry
    pub fn validate(&self, token: &str) -> Result<Claims, TokenError> {
        if token.trim().is_empty() {
            return Err(TokenError::Missing);
        }

        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e.to_string()),
            })
    }
}

/// Short SHA-256 fingerprint for logging tokens without exposing them
pub fn fingerprint(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    format!("{:x}", digest)[..12].to_string()
}
