//! Input checks applied before anything reaches the store

/// Default password minimum length
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// bcrypt only reads this many bytes of input; longer passwords would
/// collide with every password sharing their prefix
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Identifier maximum length (ids, student and employee numbers)
pub const MAX_IDENTIFIER_LENGTH: usize = 50;

/// Validate account identifier format
pub fn validate_identifier(identifier: &str) -> Result<(), String> {
    if identifier.is_empty() {
        return Err("Identifier cannot be empty".to_string());
    }

    if identifier.len() > MAX_IDENTIFIER_LENGTH {
        return Err(format!("Identifier must be at most {} characters", MAX_IDENTIFIER_LENGTH));
    }

    // Allow alphanumeric, underscore, hyphen
    if !identifier.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
        return Err("Identifier can only contain letters, numbers, underscore, and hyphen".to_string());
    }

    Ok(())
}

/// Validate email format
pub fn validate_email(email: &str) -> Result<(), String> {
    let Some((local, domain)) = email.split_once('@') else {
        return Err("Invalid email format".to_string());
    };

    if local.is_empty() || domain.contains('@') {
        return Err("Invalid email format".to_string());
    }

    let domain_ok = domain
        .split_once('.')
        .map(|(host, tld)| !host.is_empty() && !tld.is_empty() && !domain.ends_with('.'))
        .unwrap_or(false);
    if !domain_ok || email.chars().any(char::is_whitespace) {
        return Err("Invalid email format".to_string());
    }

    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), String> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(format!("Password must be at least {} characters", MIN_PASSWORD_LENGTH));
    }
    if password.len() > MAX_PASSWORD_BYTES {
        return Err(format!("Password must be at most {} bytes", MAX_PASSWORD_BYTES));
    }
    Ok(())
}

pub fn validate_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("Name cannot be empty".to_string());
    }
    Ok(())
}
