use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use super::{ValidationError, ValidationResult};

/// Trait for validating input models
pub trait Validate {
    fn validate(&self) -> ValidationResult<()>;
}

/// Validation constants
pub const MAX_NICKNAME_LENGTH: usize = 20;
pub const MAX_MEMO_LENGTH: usize = 500;
pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const MAX_PASSWORD_LENGTH: usize = 20;
pub const MAX_CART_QUANTITY: u32 = 1000;
pub const MIN_CART_QUANTITY: u32 = 1;

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").unwrap());

/// Validate email format
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let trimmed = email.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::RequiredField {
            field: "email".to_string(),
        });
    }

    if !EMAIL_PATTERN.is_match(trimmed) {
        return Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            expected: "local-part@domain".to_string(),
        });
    }

    Ok(())
}

/// Validate password policy: 8-20 characters with at least one letter,
/// one digit and one special character.
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.len() < MIN_PASSWORD_LENGTH || password.len() > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::OutOfRange {
            field: "password".to_string(),
            min: MIN_PASSWORD_LENGTH.to_string(),
            max: MAX_PASSWORD_LENGTH.to_string(),
            value: password.len().to_string(),
        });
    }

    let has_letter = password.chars().any(|c| c.is_ascii_alphabetic());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_special = password
        .chars()
        .any(|c| !c.is_ascii_alphanumeric() && !c.is_whitespace());

    if !has_letter || !has_digit || !has_special {
        return Err(ValidationError::InvalidFormat {
            field: "password".to_string(),
            expected: "at least one letter, one digit and one special character".to_string(),
        });
    }

    Ok(())
}

/// Validate nickname
pub fn validate_nickname(nickname: &str) -> ValidationResult<()> {
    let trimmed = nickname.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::RequiredField {
            field: "nickname".to_string(),
        });
    }

    if trimmed.chars().count() > MAX_NICKNAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: "nickname".to_string(),
            max_length: MAX_NICKNAME_LENGTH,
            actual_length: trimmed.chars().count(),
        });
    }

    Ok(())
}

/// Validate a monetary amount (integer KRW, never negative)
pub fn validate_amount(field: &str, amount: i64) -> ValidationResult<()> {
    if amount < 0 {
        return Err(ValidationError::InvalidValue {
            field: field.to_string(),
            value: amount.to_string(),
            reason: "Amount cannot be negative".to_string(),
        });
    }
    Ok(())
}

/// Validate cart item quantity
pub fn validate_cart_quantity(quantity: u32) -> ValidationResult<()> {
    if !(MIN_CART_QUANTITY..=MAX_CART_QUANTITY).contains(&quantity) {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: MIN_CART_QUANTITY.to_string(),
            max: MAX_CART_QUANTITY.to_string(),
            value: quantity.to_string(),
        });
    }
    Ok(())
}

/// Validate memo length
pub fn validate_memo(memo: &Option<String>) -> ValidationResult<()> {
    if let Some(memo) = memo {
        if memo.chars().count() > MAX_MEMO_LENGTH {
            return Err(ValidationError::TooLong {
                field: "memo".to_string(),
                max_length: MAX_MEMO_LENGTH,
                actual_length: memo.chars().count(),
            });
        }
    }
    Ok(())
}

/// Parse a `YYYY-MM-DD` date string
pub fn parse_date(value: &str) -> ValidationResult<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| ValidationError::InvalidFormat {
        field: "date".to_string(),
        expected: "YYYY-MM-DD".to_string(),
    })
}

/// Parse and normalize a `YYYY-MM` month string
pub fn parse_month(value: &str) -> ValidationResult<String> {
    let parts: Vec<&str> = value.split('-').collect();
    let valid = parts.len() == 2
        && parts[0].len() == 4
        && parts[0].chars().all(|c| c.is_ascii_digit())
        && parts[1].len() == 2
        && parts[1]
            .parse::<u32>()
            .map(|m| (1..=12).contains(&m))
            .unwrap_or(false);

    if !valid {
        return Err(ValidationError::InvalidFormat {
            field: "month".to_string(),
            expected: "YYYY-MM".to_string(),
        });
    }

    Ok(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("a.b+c@sub.domain.co").is_ok());

        assert!(validate_email("").is_err());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("user@domain").is_err());
        assert!(validate_email("@example.com").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("abcd1234!").is_ok());
        assert!(validate_password("P@ssw0rd").is_ok());

        assert!(validate_password("short1!").is_err()); // 7 chars
        assert!(validate_password(&format!("a1!{}", "x".repeat(18))).is_err()); // 21 chars
        assert!(validate_password("lettersonly!").is_err()); // no digit
        assert!(validate_password("12345678!").is_err()); // no letter
        assert!(validate_password("abcd1234").is_err()); // no special
    }

    #[test]
    fn test_validate_nickname() {
        assert!(validate_nickname("민수").is_ok());
        assert!(validate_nickname("").is_err());
        assert!(validate_nickname("   ").is_err());
        assert!(validate_nickname(&"가".repeat(MAX_NICKNAME_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_validate_amount() {
        assert!(validate_amount("amount", 0).is_ok());
        assert!(validate_amount("amount", 300_000).is_ok());
        assert!(validate_amount("amount", -1).is_err());
    }

    #[test]
    fn test_validate_cart_quantity() {
        assert!(validate_cart_quantity(1).is_ok());
        assert!(validate_cart_quantity(MAX_CART_QUANTITY).is_ok());
        assert!(validate_cart_quantity(0).is_err());
        assert!(validate_cart_quantity(MAX_CART_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2025-08-25").unwrap(),
            NaiveDate::from_ymd_opt(2025, 8, 25).unwrap()
        );
        assert!(parse_date("2025-13-40").is_err());
        assert!(parse_date("25/08/2025").is_err());
    }

    #[test]
    fn test_parse_month() {
        assert_eq!(parse_month("2025-08").unwrap(), "2025-08");
        assert!(parse_month("2025-13").is_err());
        assert!(parse_month("2025-8").is_err());
        assert!(parse_month("202508").is_err());
    }
}
