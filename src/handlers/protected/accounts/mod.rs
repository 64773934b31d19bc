pub mod create;
pub mod record;

// Re-export handler functions for use in routing
pub use create::post as accounts_post;
pub use record::delete as account_delete;
pub use record::get as account_get;
pub use record::patch as account_patch;
