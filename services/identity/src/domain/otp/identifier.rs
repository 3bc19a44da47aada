use bhada_common::{mask_email, mask_phone};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{Email, EmailError, Phone, PhoneError};

/// Who a code was sent to. Serialized as `{"email": ..}` or `{"phone": ..}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Identifier {
    Email(Email),
    Phone(Phone),
}

impl Identifier {
    /// Anything with an `@` is treated as an email address
    pub fn parse(raw: &str) -> Result<Self, IdentifierError> {
        if raw.contains('@') {
            Ok(Self::Email(Email::new(raw)?))
        } else {
            Ok(Self::Phone(Phone::new(raw)?))
        }
    }

    /// Rebuild from the nullable `email`/`phone` column pair
    pub fn from_columns(
        email: Option<String>,
        phone: Option<String>,
    ) -> Result<Self, IdentifierError> {
        match (email, phone) {
            (Some(email), _) => Ok(Self::Email(Email::new(email)?)),
            (None, Some(phone)) => Ok(Self::Phone(Phone::new(phone)?)),
            (None, None) => Err(IdentifierError::Missing),
        }
    }

    pub fn email(&self) -> Option<&Email> {
        match self {
            Self::Email(email) => Some(email),
            Self::Phone(_) => None,
        }
    }

    pub fn phone(&self) -> Option<&Phone> {
        match self {
            Self::Phone(phone) => Some(phone),
            Self::Email(_) => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Email(email) => email.as_str(),
            Self::Phone(phone) => phone.as_str(),
        }
    }

    /// Safe to log
    pub fn masked(&self) -> String {
        match self {
            Self::Email(email) => mask_email(email.as_str()),
            Self::Phone(phone) => mask_phone(phone.as_str()),
        }
    }
}

impl From<Email> for Identifier {
    fn from(email: Email) -> Self {
        Self::Email(email)
    }
}

impl From<Phone> for Identifier {
    fn from(phone: Phone) -> Self {
        Self::Phone(phone)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IdentifierError {
    #[error(transparent)]
    Email(#[from] EmailError),

    #[error(transparent)]
    Phone(#[from] PhoneError),

    #[error("An email address or phone number is required")]
    Missing,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_picks_channel() {
        assert!(matches!(
            Identifier::parse("Ravi@Example.com").unwrap(),
            Identifier::Email(_)
        ));
        assert!(matches!(
            Identifier::parse("+91 98765 43210").unwrap(),
            Identifier::Phone(_)
        ));
        assert!(Identifier::parse("ravi@").is_err());
    }

    #[test]
    fn test_from_columns() {
        let id = Identifier::from_columns(None, Some("9876543210".to_string())).unwrap();
        assert_eq!(id.as_str(), "9876543210");
        assert!(matches!(
            Identifier::from_columns(None, None),
            Err(IdentifierError::Missing)
        ));
    }

    #[test]
    fn test_masked() {
        let id = Identifier::parse("ravi@example.com").unwrap();
        assert_eq!(id.masked(), "ra***@example.com");
    }
}
