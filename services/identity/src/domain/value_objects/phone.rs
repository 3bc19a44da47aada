//! Phone number value object

use serde::{Deserialize, Serialize};
use std::fmt;

const MIN_DIGITS: usize = 10;
const MAX_DIGITS: usize = 15;

/// Phone number with separators stripped.
///
/// Keeps a leading `+` when present. Spaces, dashes, dots and parentheses are
/// dropped, so `+91 98765-43210` and `+919876543210` compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Phone(String);

impl Phone {
    pub fn new(phone: impl Into<String>) -> Result<Self, PhoneError> {
        let raw = phone.into();
        let trimmed = raw.trim();

        let (plus, rest) = match trimmed.strip_prefix('+') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };

        let mut digits = String::with_capacity(rest.len());
        for c in rest.chars() {
            match c {
                '0'..='9' => digits.push(c),
                ' ' | '-' | '.' | '(' | ')' => {}
                _ => return Err(PhoneError::InvalidFormat(raw)),
            }
        }

        if !(MIN_DIGITS..=MAX_DIGITS).contains(&digits.len()) {
            return Err(PhoneError::InvalidFormat(raw));
        }

        Ok(Self(if plus { format!("+{}", digits) } else { digits }))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Phone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for Phone {
    type Error = PhoneError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Phone> for String {
    fn from(phone: Phone) -> Self {
        phone.0
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PhoneError {
    #[error("Invalid phone number: {0}")]
    InvalidFormat(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_separators_are_stripped() {
        let phone = Phone::new("+91 98765-43210").unwrap();
        assert_eq!(phone.as_str(), "+919876543210");
        assert_eq!(phone, Phone::new("+919876543210").unwrap());
    }

    #[test]
    fn test_local_number_without_plus() {
        assert_eq!(Phone::new("9876543210").unwrap().as_str(), "9876543210");
    }

    #[test]
    fn test_invalid_numbers() {
        assert!(Phone::new("").is_err());
        assert!(Phone::new("12345").is_err());
        assert!(Phone::new("98765abc10").is_err());
        assert!(Phone::new("+1234567890123456").is_err());
        assert!(Phone::new("++919876543210").is_err());
    }
}
