use axum::{extract::rejection::JsonRejection, extract::State, Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
}

/// PUT /api/auth/password - Change the caller's own password
///
/// A wrong `current_password` answers 401. Issued tokens stay valid until
/// they expire.
pub async fn put(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<PasswordChange>, JsonRejection>,
) -> ApiResult<Value> {
    let Json(change) = payload?;
    state
        .credentials
        .change_password(&user.account_id, &change.current_password, &change.new_password)
        .await?;
    Ok(ApiResponse::success(json!({ "updated": true })))
}
