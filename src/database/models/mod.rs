pub mod account;
pub mod history;

pub use account::{Account, AccountUpdate, NewAccount, PasswordHash, DEFAULT_STATUS};
pub use history::{HistoryEntry, HistoryRecord};
