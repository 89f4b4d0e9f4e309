//! Phone number value object.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::ValidationError;

const MIN_DIGITS: usize = 10;
const MAX_DIGITS: usize = 15;

/// A client's phone number, unique within a gym.
///
/// Spaces, dashes and parentheses are stripped on construction; the stored
/// form is digits with an optional leading `+`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PhoneNumber(String);

impl PhoneNumber {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::empty_field("phone_number"));
        }

        let (plus, rest) = match trimmed.strip_prefix('+') {
            Some(rest) => ("+", rest),
            None => ("", trimmed),
        };

        let mut digits = String::with_capacity(rest.len());
        for c in rest.chars() {
            match c {
                '0'..='9' => digits.push(c),
                ' ' | '-' | '(' | ')' => {}
                other => {
                    return Err(ValidationError::invalid_format(
                        "phone_number",
                        format!("unexpected character '{}'", other),
                    ))
                }
            }
        }

        if !(MIN_DIGITS..=MAX_DIGITS).contains(&digits.len()) {
            return Err(ValidationError::out_of_range(
                "phone_number",
                MIN_DIGITS as i64,
                MAX_DIGITS as i64,
                digits.len() as i64,
            ));
        }

        Ok(Self(format!("{}{}", plus, digits)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PhoneNumber {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PhoneNumber> for String {
    fn from(phone: PhoneNumber) -> Self {
        phone.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_ten_digit_local_number() {
        assert_eq!(PhoneNumber::parse("9876543210").unwrap().as_str(), "9876543210");
    }

    #[test]
    fn keeps_leading_plus_and_strips_separators() {
        let phone = PhoneNumber::parse(" +91 98765-43210 ").unwrap();
        assert_eq!(phone.as_str(), "+919876543210");
    }

    #[test]
    fn rejects_short_and_long_numbers() {
        assert!(PhoneNumber::parse("12345").is_err());
        assert!(PhoneNumber::parse("1234567890123456").is_err());
    }

    #[test]
    fn rejects_letters() {
        let err = PhoneNumber::parse("98765abcde").unwrap_err();
        assert!(matches!(err, ValidationError::InvalidFormat { .. }));
    }

    #[test]
    fn rejects_empty() {
        assert_eq!(
            PhoneNumber::parse("  ").unwrap_err(),
            ValidationError::empty_field("phone_number")
        );
    }

    #[test]
    fn deserialization_validates() {
        assert!(serde_json::from_str::<PhoneNumber>("\"9876543210\"").is_ok());
        assert!(serde_json::from_str::<PhoneNumber>("\"nope\"").is_err());
    }
}
