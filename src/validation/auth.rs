use crate::error::{AppError, Result};
use crate::messages;

/// Trims surrounding whitespace from a submitted username.
pub fn sanitize_username(username: &str) -> String {
    username.trim().to_string()
}

/// Checks that both login fields were supplied.
pub fn validate_login(username: &str, password: &str) -> Result<()> {
    if username.is_empty() || password.is_empty() {
        return Err(AppError::Validation(
            messages::LOGIN_FIELDS_REQUIRED.to_string(),
        ));
    }

    Ok(())
}

/// Validates a registration form.
///
/// # Arguments
///
/// * `username` - The sanitized username.
/// * `email` - The trimmed email, empty when not supplied.
/// * `email_required` - Whether the active store needs an email.
/// * `password` - The password.
/// * `confirm_password` - The repeated password.
///
/// # Returns
///
/// A `Result<()>` indicating whether the form is acceptable.
pub fn validate_registration(
    username: &str,
    email: &str,
    email_required: bool,
    password: &str,
    confirm_password: &str,
) -> Result<()> {
    if username.is_empty() || password.is_empty() || (email_required && email.is_empty()) {
        return Err(AppError::Validation(
            messages::REGISTER_FIELDS_REQUIRED.to_string(),
        ));
    }

    if password != confirm_password {
        return Err(AppError::Validation(
            messages::PASSWORD_MISMATCH.to_string(),
        ));
    }

    Ok(())
}
