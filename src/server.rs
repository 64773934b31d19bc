use axum::{
    extract::{DefaultBodyLimit, State},
    http::{HeaderValue, Method, StatusCode},
    middleware,
    response::{IntoResponse, Json},
    routing::{get, post, put},
    Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::handlers::{protected, public};
use crate::middleware::jwt_auth_middleware;
use crate::state::AppState;

/// Full application router
pub fn app(state: AppState) -> Router {
    let mut router = Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(auth_public_routes())
        // Protected API
        .merge(protected_routes(state.clone()))
        .layer(DefaultBodyLimit::max(state.config.api.max_request_size_bytes));

    if state.config.security.enable_cors {
        router = router.layer(cors_layer(&state.config.security.cors_origins));
    }
    if state.config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }

    router.with_state(state)
}

fn auth_public_routes() -> Router<AppState> {
    use public::auth;

    Router::new()
        .route("/auth/login", post(auth::login_post))
        .route("/auth/register", post(auth::register_post))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    use protected::{accounts, auth, history};

    Router::new()
        // The caller's own session
        .route("/api/auth/whoami", get(auth::session_whoami))
        .route("/api/auth/password", put(auth::password_put))
        // Account management
        .route("/api/accounts", post(accounts::accounts_post))
        .route(
            "/api/accounts/:id",
            get(accounts::account_get)
                .patch(accounts::account_patch)
                .delete(accounts::account_delete),
        )
        // Change history
        .route("/api/accounts/:id/history", get(history::history_list))
        .route("/api/history/export", get(history::history_export))
        .route_layer(middleware::from_fn_with_state(state, jwt_auth_middleware))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE])
        .allow_headers(Any);

    if origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", o);
                None
            }
        })
        .collect();
    layer.allow_origin(origins)
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Campus Discipline API",
            "version": version,
            "description": "Credential, token and account change-history service",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "public_auth": "/auth/login, /auth/register (public - token acquisition)",
                "auth": "/api/auth/whoami, /api/auth/password (protected)",
                "accounts": "/api/accounts[/:id] (protected, role-gated)",
                "history": "/api/accounts/:id/history, /api/history/export (protected, role-gated)",
            }
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "code": "SERVICE_UNAVAILABLE",
                    "data": {
                        "status": "degraded",
                        "timestamp": now
                    }
                })),
            )
        }
    }
}
