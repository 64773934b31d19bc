// handlers/protected/mod.rs - Protected handlers (token required)
//
// Route prefix /api/*. jwt_auth_middleware has already attached an AuthUser;
// each handler applies its own role policy on top of it.
pub mod accounts; // /api/accounts[/:id]
pub mod auth; // /api/auth/* - the caller's own session and password
pub mod history; // /api/accounts/:id/history, /api/history/export
