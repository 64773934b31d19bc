/// Shared types used across the codebase

use serde::{Deserialize, Serialize};

/// Roles known to the authorization layer, keyed by `roles.id`.
/// Tokens carry the raw id; handlers resolve it through [`Role::from_id`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum Role {
    Administrator = 1,
    Staff = 2,
    Student = 3,
}

impl Role {
    pub fn from_id(id: i32) -> Option<Self> {
        match id {
            1 => Some(Role::Administrator),
            2 => Some(Role::Staff),
            3 => Some(Role::Student),
            _ => None,
        }
    }

    pub fn id(self) -> i32 {
        self as i32
    }

    pub fn label(self) -> &'static str {
        match self {
            Role::Administrator => "Administrator",
            Role::Staff => "Staff",
            Role::Student => "Student",
        }
    }

    /// Roles allowed to manage other principals' records
    pub const MANAGERS: &'static [Role] = &[Role::Administrator, Role::Staff];
}
