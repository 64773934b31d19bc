use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Extension, Json,
};
use serde_json::{json, Value};

use crate::auth::validation;
use crate::database::models::{Account, AccountUpdate};
use crate::database::store::AccountUpdateOutcome;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;
use crate::types::Role;

/// GET /api/accounts/:id - Single account (self, Staff or Administrator)
pub async fn get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Account> {
    user.require_self_or(Role::MANAGERS, &id)?;

    let account = state
        .store
        .find_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Account '{}' not found", id)))?;
    Ok(ApiResponse::success(account))
}

/// PATCH /api/accounts/:id - Partial update (Staff or Administrator)
///
/// Only an Administrator may change `role_id`. When a tracked field changes,
/// the response carries the history record written alongside the update;
/// otherwise `history` is null.
pub async fn patch(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    payload: Result<Json<AccountUpdate>, JsonRejection>,
) -> ApiResult<AccountUpdateOutcome> {
    user.require_role(Role::MANAGERS)?;
    let Json(update) = payload?;

    if update.changes_role() {
        user.require_role(&[Role::Administrator])?;
    }
    validate_update(&update)?;

    let outcome = state
        .store
        .update_account(&id, &user.account_id, &update)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Account '{}' not found", id)))?;

    if let Some(record) = &outcome.history {
        tracing::info!(
            "Account '{}' updated by '{}'; tracked changes: {:?}",
            id,
            user.account_id,
            record.changed_fields()
        );
    }
    Ok(ApiResponse::success(outcome))
}

/// DELETE /api/accounts/:id - Hard delete (Administrator)
///
/// History rows referencing the account are kept.
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    user.require_role(&[Role::Administrator])?;

    if !state.store.delete_account(&id).await? {
        return Err(ApiError::not_found(format!("Account '{}' not found", id)));
    }

    tracing::info!("Account '{}' deleted by '{}'", id, user.account_id);
    Ok(ApiResponse::success(json!({ "id": id, "deleted": true })))
}

fn validate_update(update: &AccountUpdate) -> Result<(), ApiError> {
    if update.is_empty() {
        return Err(ApiError::bad_request("No fields to update"));
    }
    if let Some(name) = &update.name {
        validation::validate_name(name).map_err(|e| ApiError::field_error("name", e))?;
    }
    if let Some(email) = &update.email {
        validation::validate_email(email).map_err(|e| ApiError::field_error("email", e))?;
    }
    if let Some(status) = &update.status {
        if status.trim().is_empty() {
            return Err(ApiError::field_error("status", "Status cannot be empty"));
        }
    }
    if let Some(role_id) = update.role_id {
        if Role::from_id(role_id).is_none() {
            return Err(ApiError::field_error("role_id", format!("Unknown role id {}", role_id)));
        }
    }
    Ok(())
}
