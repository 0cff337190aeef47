// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Credential input validation.
//!
//! Checks run in a fixed order and the first failure wins, so a request with
//! several problems always gets the same message.

/// Minimum username length, in characters.
pub const MIN_USERNAME_LEN: usize = 3;

/// Maximum username length, in characters.
pub const MAX_USERNAME_LEN: usize = 50;

/// Minimum password length, in characters.
pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Username and password are required")]
    MissingCredentials,

    #[error("Username must be at least 3 characters")]
    UsernameTooShort,

    #[error("Username must be at most 50 characters")]
    UsernameTooLong,

    #[error("Password must be at least 6 characters")]
    PasswordTooShort,

    #[error("Username can only contain letters, numbers, and underscores")]
    UsernameCharset,
}

/// Validate signup input.
pub fn validate_signup(username: &str, password: &str) -> Result<(), ValidationError> {
    validate_login(username, password)?;

    let username_len = username.chars().count();
    if username_len < MIN_USERNAME_LEN {
        return Err(ValidationError::UsernameTooShort);
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort);
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(ValidationError::UsernameCharset);
    }
    if username_len > MAX_USERNAME_LEN {
        return Err(ValidationError::UsernameTooLong);
    }
    Ok(())
}

/// Validate login input. Only presence is checked.
pub fn validate_login(username: &str, password: &str) -> Result<(), ValidationError> {
    if username.is_empty() || password.is_empty() {
        return Err(ValidationError::MissingCredentials);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_well_formed_signup() {
        assert_eq!(validate_signup("researcher_01", "secret1"), Ok(()));
        assert_eq!(validate_signup("abc", "123456"), Ok(()));
        assert_eq!(validate_signup(&"a".repeat(50), "123456"), Ok(()));
    }

    #[test]
    fn missing_fields_are_reported_first() {
        assert_eq!(
            validate_signup("", "secret1"),
            Err(ValidationError::MissingCredentials)
        );
        assert_eq!(
            validate_signup("ab", ""),
            Err(ValidationError::MissingCredentials)
        );
    }

    #[test]
    fn short_username_beats_short_password() {
        assert_eq!(
            validate_signup("ab", "123"),
            Err(ValidationError::UsernameTooShort)
        );
        assert_eq!(
            validate_signup("abc", "12345"),
            Err(ValidationError::PasswordTooShort)
        );
    }

    #[test]
    fn rejects_disallowed_characters() {
        for username in ["has space", "dot.name", "dash-name", "émile"] {
            assert_eq!(
                validate_signup(username, "secret1"),
                Err(ValidationError::UsernameCharset),
                "{username}"
            );
        }
    }

    #[test]
    fn rejects_overlong_username() {
        assert_eq!(
            validate_signup(&"a".repeat(51), "secret1"),
            Err(ValidationError::UsernameTooLong)
        );
    }

    #[test]
    fn login_only_checks_presence() {
        assert_eq!(validate_login("x", "y"), Ok(()));
        assert_eq!(
            validate_login("", "y"),
            Err(ValidationError::MissingCredentials)
        );
        assert_eq!(
            ValidationError::MissingCredentials.to_string(),
            "Username and password are required"
        );
    }
}
