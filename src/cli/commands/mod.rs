pub mod account;
pub mod history;
