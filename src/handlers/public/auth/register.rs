// handlers/public/auth/register.rs - POST /auth/register handler

use axum::{extract::rejection::JsonRejection, extract::State, Json};

use crate::auth::Registration;
use crate::database::models::Account;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;
use crate::types::Role;

/// POST /auth/register - Self-registration
///
/// Accepts the same body as `POST /api/accounts`. Any `role_id` or `status`
/// in the body is discarded: self-registered accounts are always active
/// Students. Answers 403 when self-registration is disabled and 409 when an
/// identifier is already in use.
pub async fn post(
    State(state): State<AppState>,
    payload: Result<Json<Registration>, JsonRejection>,
) -> ApiResult<Account> {
    if !state.config.security.allow_self_registration {
        return Err(ApiError::forbidden("Self-registration is disabled"));
    }

    let Json(mut registration) = payload?;
    registration.role_id = None;
    registration.status = None;

    let account = state.credentials.register(registration, Role::Student).await?;
    Ok(ApiResponse::created(account))
}
