// handlers/public/auth/login.rs - POST /auth/login handler

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::Deserialize;

use crate::auth::IssuedToken;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct LoginRequest {
    /// Account id, student number or employee number
    pub identifier: String,
    pub password: String,
}

/// POST /auth/login - Authenticate and receive a session token
///
/// Expected Input:
/// ```json
/// { "identifier": "S001", "password": "secret123" }
/// ```
///
/// Expected Output (Success):
/// ```json
/// {
///   "success": true,
///   "data": {
///     "token": "eyJhbGciOiJIUzI1NiI...",
///     "role_id": 3,
///     "expires_in": 3600,
///     "expires_at": "2025-01-01T01:00:00Z"
///   }
/// }
/// ```
///
/// Unknown identifiers and wrong passwords both answer 401 with the same body.
pub async fn post(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<IssuedToken> {
    let Json(request) = payload?;
    let issued = state
        .credentials
        .authenticate(&request.identifier, &request.password)
        .await?;
    Ok(ApiResponse::success(issued))
}
