use crate::auth::Registration;
use crate::database::models::{NewAccount, PasswordHash, DEFAULT_STATUS};
use crate::types::Role;

/// Student account with no department or program, ready to insert
pub fn sample_account(id: &str, hash: &str) -> NewAccount {
    NewAccount {
        id: id.to_string(),
        student_number: None,
        employee_number: None,
        name: format!("Student {}", id),
        email: None,
        password_hash: PasswordHash::new(hash.to_string()),
        role_id: Role::Student.id(),
        department_id: None,
        program_id: None,
        year_level: None,
        status: DEFAULT_STATUS.to_string(),
        batch: None,
        photo: None,
    }
}

/// Minimal registration payload that passes validation
pub fn registration(id: &str, password: &str) -> Registration {
    Registration {
        id: id.to_string(),
        student_number: None,
        employee_number: None,
        name: format!("Student {}", id),
        email: None,
        password: password.to_string(),
        role_id: None,
        department_id: None,
        program_id: None,
        year_level: None,
        status: None,
        batch: None,
        photo: None,
    }
}
