use axum::{
    body::Body,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Extension,
};

use crate::error::ApiError;
use crate::history::csv_stream;
use crate::middleware::AuthUser;
use crate::state::AppState;
use crate::types::Role;

/// GET /api/history/export - Every history record as CSV (Staff or Administrator)
///
/// The body is streamed from a store cursor. Once the header has gone out
/// the status is fixed at 200, so a mid-stream store failure truncates the
/// body instead of turning into an error response.
pub async fn get(State(state): State<AppState>, Extension(user): Extension<AuthUser>) -> Result<Response, ApiError> {
    user.require_role(Role::MANAGERS)?;

    tracing::info!("History export started by '{}'", user.account_id);
    let body = Body::from_stream(csv_stream(state.store.clone()));

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"account_history.csv\""),
        ],
        body,
    )
        .into_response())
}
