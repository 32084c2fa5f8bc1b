//! Input validation for identifiers, credentials and password changes.
//!
//! Every check here runs before a request is built, so a failure never
//! reaches the network. Checks return the message shown to the user.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Loose email shape: `local@domain.tld`, no whitespace, exactly one '@'
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[^\s@]+@[^\s@]+\.[^\s@]+$"
    ).unwrap();

    /// Pakistani numbers: `+92-DDD-DDDDDDD` or `03DDDDDDDDD`
    static ref PHONE_REGEX: Regex = Regex::new(
        r"^(?:\+92-[0-9]{3}-[0-9]{7}|03[0-9]{9})$"
    ).unwrap();
}

/// Minimum length accepted for a new password
pub const MIN_PASSWORD_LEN: usize = 6;

/// Check the loose email shape.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}

/// Check the `+92-DDD-DDDDDDD` / `03DDDDDDDDD` phone formats.
pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_REGEX.is_match(phone)
}

/// An identifier is either an email or a phone number
pub fn is_valid_identifier(identifier: &str) -> bool {
    is_valid_email(identifier) || is_valid_phone(identifier)
}

/// Validate login credentials
pub fn validate_credentials(identifier: &str, password: &str) -> Result<(), String> {
    if identifier.is_empty() || password.is_empty() {
        return Err("Identifier and password are required.".to_string());
    }
    Ok(())
}

/// Validate registration input. Stricter than login: the identifier must
/// look like an email or a phone number.
pub fn validate_registration(identifier: &str, password: &str) -> Result<(), String> {
    validate_credentials(identifier, password)?;

    if !is_valid_identifier(identifier) {
        return Err("Identifier must be a valid email or phone number.".to_string());
    }

    Ok(())
}

/// Validate a password change. Checks run in a fixed order and the first
/// failure wins.
pub fn validate_password_change(old: &str, new: &str, confirm: &str) -> Result<(), String> {
    if old.is_empty() || new.is_empty() || confirm.is_empty() {
        return Err("All fields are required.".to_string());
    }

    if new.chars().count() < MIN_PASSWORD_LEN {
        return Err(format!(
            "New password must be at least {} characters long.",
            MIN_PASSWORD_LEN
        ));
    }

    if new != confirm {
        return Err("New password and confirmation password do not match.".to_string());
    }

    if old == new {
        return Err("New password must be different from the old password.".to_string());
    }

    Ok(())
}
