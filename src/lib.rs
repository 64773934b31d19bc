pub mod auth;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod history;
pub mod middleware;
pub mod server;
pub mod state;
pub mod types;

#[cfg(test)]
pub mod testing;
