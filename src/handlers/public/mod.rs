// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Token acquisition and self-registration. Every input here is untrusted,
// so validation happens before anything reaches the store.
pub mod auth;
