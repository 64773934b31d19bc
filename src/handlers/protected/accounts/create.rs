use axum::{extract::rejection::JsonRejection, extract::State, Extension, Json};

use crate::auth::Registration;
use crate::database::models::Account;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;
use crate::types::Role;

/// POST /api/accounts - Create an account (Administrator)
///
/// Unlike self-registration the body may choose `role_id` and `status`;
/// without a role the account is a Student.
pub async fn post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<Registration>, JsonRejection>,
) -> ApiResult<Account> {
    user.require_role(&[Role::Administrator])?;
    let Json(registration) = payload?;

    let account = state.credentials.register(registration, Role::Student).await?;
    tracing::info!("Account '{}' created by '{}'", account.id, user.account_id);
    Ok(ApiResponse::created(account))
}
