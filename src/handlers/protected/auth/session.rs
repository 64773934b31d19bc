use axum::{extract::State, Extension};

use crate::database::models::Account;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

/// GET /api/auth/whoami - Profile of the authenticated account
///
/// A token can outlive its account (hard delete); that case answers 404.
pub async fn whoami(State(state): State<AppState>, Extension(user): Extension<AuthUser>) -> ApiResult<Account> {
    let account = state
        .store
        .find_by_id(&user.account_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Account not found"))?;
    Ok(ApiResponse::success(account))
}
