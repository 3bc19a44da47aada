//! Password value objects
//!
//! Policy: 8 to 128 characters, at least one letter and one digit, and not
//! one of the passwords people reach for first.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use serde::{Deserialize, Serialize};
use std::fmt;

const MIN_LENGTH: usize = 8;
const MAX_LENGTH: usize = 128;

const COMMON_PASSWORDS: &[&str] = &[
    "password",
    "password1",
    "password123",
    "passw0rd",
    "12345678",
    "123456789",
    "1234567890",
    "qwerty123",
    "abc12345",
    "abcd1234",
    "iloveyou1",
    "welcome1",
    "welcome123",
    "admin123",
    "letmein1",
    "india123",
    "bhada123",
    "qwerty12",
    "1q2w3e4r",
    "trustno1",
];

/// Plain-text password that passed the policy checks
pub struct Password(String);

impl Password {
    pub fn new(password: impl Into<String>) -> Result<Self, PasswordError> {
        let password = password.into();
        Self::validate(&password)?;
        Ok(Self(password))
    }

    pub fn validate(password: &str) -> Result<(), PasswordError> {
        let length = password.chars().count();
        if length < MIN_LENGTH {
            return Err(PasswordError::TooShort(MIN_LENGTH));
        }
        if length > MAX_LENGTH {
            return Err(PasswordError::TooLong(MAX_LENGTH));
        }
        if !password.chars().any(char::is_alphabetic) {
            return Err(PasswordError::MissingLetter);
        }
        if !password.chars().any(|c| c.is_ascii_digit()) {
            return Err(PasswordError::MissingDigit);
        }
        if COMMON_PASSWORDS.contains(&password.to_lowercase().as_str()) {
            return Err(PasswordError::TooCommon);
        }
        Ok(())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Argon2id hash with a random salt
    pub fn hash(&self) -> Result<HashedPassword, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(self.0.as_bytes(), &salt)
            .map_err(|e| PasswordError::HashingFailed(e.to_string()))?
            .to_string();
        Ok(HashedPassword(hash))
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password([REDACTED])")
    }
}

/// PHC-formatted argon2 hash
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HashedPassword(String);

impl HashedPassword {
    /// Validate against the policy, then hash
    pub fn from_plain(plain: &str) -> Result<Self, PasswordError> {
        Password::new(plain)?.hash()
    }

    /// `from_plain` with the argon2 work on the blocking pool
    pub async fn from_plain_async(plain: &str) -> Result<Self, PasswordError> {
        let password = Password::new(plain)?;
        tokio::task::spawn_blocking(move || password.hash())
            .await
            .map_err(|e| PasswordError::HashingFailed(format!("Task join error: {}", e)))?
    }

    pub fn from_hash(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    pub fn verify(&self, plain: &str) -> Result<bool, PasswordError> {
        let parsed =
            PasswordHash::new(&self.0).map_err(|e| PasswordError::InvalidHash(e.to_string()))?;

        Ok(Argon2::default()
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok())
    }

    /// `verify` with the argon2 work on the blocking pool
    pub async fn verify_async(&self, plain: &str) -> Result<bool, PasswordError> {
        let hashed = self.clone();
        let plain = plain.to_owned();
        tokio::task::spawn_blocking(move || hashed.verify(&plain))
            .await
            .map_err(|e| PasswordError::HashingFailed(format!("Task join error: {}", e)))?
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for HashedPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("HashedPassword([REDACTED])")
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("Password must be at least {0} characters long")]
    TooShort(usize),

    #[error("Password must be at most {0} characters long")]
    TooLong(usize),

    #[error("Password must contain at least one letter")]
    MissingLetter,

    #[error("Password must contain at least one digit")]
    MissingDigit,

    #[error("Password is too common")]
    TooCommon,

    #[error("Password hashing failed: {0}")]
    HashingFailed(String),

    #[error("Stored password hash is invalid: {0}")]
    InvalidHash(String),
}

impl PasswordError {
    /// Policy violations, as opposed to hashing failures
    pub fn is_policy_violation(&self) -> bool {
        !matches!(self, Self::HashingFailed(_) | Self::InvalidHash(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy() {
        assert!(matches!(Password::validate("ab1"), Err(PasswordError::TooShort(8))));
        assert!(matches!(Password::validate("abcdefgh"), Err(PasswordError::MissingDigit)));
        assert!(matches!(Password::validate("12345670"), Err(PasswordError::MissingLetter)));
        assert!(matches!(Password::validate("Password1"), Err(PasswordError::TooCommon)));
        assert!(Password::validate("flat4rent").is_ok());
    }

    #[test]
    fn test_hash_and_verify() {
        let hashed = HashedPassword::from_plain("flat4rent").unwrap();
        assert!(hashed.as_str().starts_with("$argon2"));
        assert!(hashed.verify("flat4rent").unwrap());
        assert!(!hashed.verify("flat4sale").unwrap());
    }

    #[tokio::test]
    async fn test_hash_and_verify_off_the_runtime() {
        let hashed = HashedPassword::from_plain_async("flat4rent").await.unwrap();
        assert!(hashed.verify_async("flat4rent").await.unwrap());
        assert!(!hashed.verify_async("flat4sale").await.unwrap());
    }

    #[tokio::test]
    async fn test_policy_checked_before_hashing() {
        let err = HashedPassword::from_plain_async("password1").await.unwrap_err();
        assert!(matches!(err, PasswordError::TooCommon));
    }

    #[test]
    fn test_debug_is_redacted() {
        let hashed = HashedPassword::from_plain("flat4rent").unwrap();
        assert_eq!(format!("{:?}", hashed), "HashedPassword([REDACTED])");
    }

    #[test]
    fn test_policy_violation_classification() {
        assert!(PasswordError::TooCommon.is_policy_violation());
        assert!(!PasswordError::HashingFailed("x".into()).is_policy_violation());
    }
}
