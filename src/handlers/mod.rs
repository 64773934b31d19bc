// handlers/mod.rs - two handler tiers
//
// Public (no token) → Protected (token validated by jwt_auth_middleware).
// Role checks happen inside each protected handler, never in the middleware.
pub mod public; // Tier 1: /auth/*, no authentication
pub mod protected; // Tier 2: /api/*, token required
