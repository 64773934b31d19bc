pub mod export;
pub mod list;

// Re-export handler functions for use in routing
pub use export::get as history_export;
pub use list::get as history_list;
