use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::auth::{fingerprint, Claims, TokenError};
use crate::error::ApiError;
use crate::state::AppState;
use crate::types::Role;

/// Authenticated principal extracted from a validated token.
///
/// Carries identity only. Endpoints decide what the principal may do via
/// [`AuthUser::require_role`] and [`AuthUser::require_self_or`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthUser {
    pub account_id: String,
    pub role_id: i32,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            account_id: claims.sub,
            role_id: claims.role_id,
        }
    }
}

impl AuthUser {
    /// `None` for role ids the service does not know
    pub fn role(&self) -> Option<Role> {
        Role::from_id(self.role_id)
    }

    pub fn is_self(&self, account_id: &str) -> bool {
        self.account_id == account_id
    }

    pub fn require_role(&self, allowed: &[Role]) -> Result<(), ApiError> {
        match self.role() {
            Some(role) if allowed.contains(&role) => Ok(()),
            _ => {
                tracing::warn!(
                    "Account '{}' with role {} denied; requires one of {:?}",
                    self.account_id,
                    self.role_id,
                    allowed
                );
                Err(ApiError::forbidden("Insufficient permissions"))
            }
        }
    }

    /// Passes for the account itself or any of `allowed`
    pub fn require_self_or(&self, allowed: &[Role], account_id: &str) -> Result<(), ApiError> {
        if self.is_self(account_id) {
            return Ok(());
        }
        self.require_role(allowed)
    }
}

/// Token validation middleware: rejects the request or attaches [`AuthUser`]
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Response {
    let token = match extract_token_from_headers(&headers) {
        Ok(token) => token,
        Err(e) => return e.into_response(),
    };

    let claims = match state.tokens.validate(token) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::warn!("Rejected token {}: {}", fingerprint(token), e);
            return ApiError::from(e).into_response();
        }
    };

    request.extensions_mut().insert(AuthUser::from(claims));
    next.run(request).await
}

/// Raw token from the Authorization header; a `Bearer ` prefix is stripped
fn extract_token_from_headers(headers: &HeaderMap) -> Result<&str, ApiError> {
    let value = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| ApiError::from(TokenError::Missing))?;

    let raw = value
        .to_str()
        .map_err(|_| ApiError::forbidden("Invalid Authorization header format"))?
        .trim();

    let token = raw.strip_prefix("Bearer ").unwrap_or(raw).trim();
    if token.is_empty() {
        return Err(TokenError::Missing.into());
    }
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, StatusCode};

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(axum::http::header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn raw_and_bearer_tokens_are_accepted() {
        assert_eq!(extract_token_from_headers(&headers("abc.def.ghi")).unwrap(), "abc.def.ghi");
        assert_eq!(extract_token_from_headers(&headers("Bearer abc.def.ghi")).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn absent_or_blank_header_is_unauthorized() {
        let err = extract_token_from_headers(&HeaderMap::new()).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        let err = extract_token_from_headers(&headers("Bearer ")).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn role_checks() {
        let student = AuthUser {
            account_id: "S001".into(),
            role_id: Role::Student.id(),
        };
        assert!(student.require_role(Role::MANAGERS).is_err());
        assert!(student.require_self_or(Role::MANAGERS, "S001").is_ok());
        assert!(student.require_self_or(Role::MANAGERS, "S002").is_err());

        let unknown = AuthUser {
            account_id: "X001".into(),
            role_id: 42,
        };
        assert!(unknown.role().is_none());
        assert!(unknown.require_role(&[Role::Administrator, Role::Staff, Role::Student]).is_err());
    }
}
