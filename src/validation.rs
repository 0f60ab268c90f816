//! Password pattern shared by the registration and login schemas.

use validator::ValidationError;

/// Symbols accepted in passwords; at least one is required.
pub const PASSWORD_SYMBOLS: &str = "@.#$!%*?&";

pub const PASSWORD_MIN_LENGTH: usize = 8;
pub const PASSWORD_MAX_LENGTH: usize = 32;

/// Check a password against the account password rule.
///
/// 8-32 characters drawn only from ASCII letters, digits and
/// [`PASSWORD_SYMBOLS`], with at least one lowercase letter, one uppercase
/// letter, one digit and one symbol.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    let len = password.chars().count();
    let allowed = password
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || PASSWORD_SYMBOLS.contains(c));

    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_symbol = password.chars().any(|c| PASSWORD_SYMBOLS.contains(c));

    if (PASSWORD_MIN_LENGTH..=PASSWORD_MAX_LENGTH).contains(&len)
        && allowed
        && has_lower
        && has_upper
        && has_digit
        && has_symbol
    {
        return Ok(());
    }

    let mut err = ValidationError::new("password_pattern");
    err.message = Some(
        "Password must be 8-32 characters with lowercase, uppercase, digit and one of @.#$!%*?&"
            .into(),
    );
    Err(err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_conforming_passwords() {
        for password in ["Abc12345!", "zZ9@zZ9@", "Aa1.Aa1.Aa1.Aa1.Aa1.Aa1.Aa1.Aa1."] {
            assert!(validate_password(password).is_ok(), "{password}");
        }
    }

    #[test]
    fn test_rejects_missing_classes() {
        for password in ["abc12345!", "ABC12345!", "Abcdefgh!", "Abc123456"] {
            assert!(validate_password(password).is_err(), "{password}");
        }
    }

    #[test]
    fn test_rejects_bad_length() {
        assert!(validate_password("Ab1!").is_err());
        assert!(validate_password(&format!("Ab1!{}", "a".repeat(29))).is_err());
    }

    #[test]
    fn test_rejects_characters_outside_the_set() {
        assert!(validate_password("Abc12345! ").is_err());
        assert!(validate_password("Abc12345^").is_err());
        assert!(validate_password("Äbc12345!").is_err());
    }
}
