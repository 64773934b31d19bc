// handlers/public/auth/mod.rs - Public authentication handlers

pub mod login; // POST /auth/login - verify credentials, issue token
pub mod register; // POST /auth/register - self-registration as Student

pub use login::post as login_post;
pub use register::post as register_post;
