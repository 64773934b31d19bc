use axum::{
    extract::{Path, State},
    Extension,
};

use crate::database::models::HistoryEntry;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;
use crate::types::Role;

/// GET /api/accounts/:id/history - Change history, most recent first
///
/// Students may read their own history only. An account with no recorded
/// changes, or one that never existed, yields an empty list.
pub async fn get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Vec<HistoryEntry>> {
    user.require_self_or(Role::MANAGERS, &id)?;

    let entries = state.store.list_history(&id).await?;
    Ok(ApiResponse::success(entries))
}
