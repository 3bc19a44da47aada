//! OTP record entity

use bhada_common::OtpId;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::{Identifier, OtpCode, OtpPurpose};

/// A single issued code.
///
/// Only the SHA-256 hash of the code is kept. A record verifies at most once:
/// it must be unused, not superseded by a newer code, issued for the same
/// purpose, and checked strictly before `expires_at`. Every verification
/// claims one attempt; once the attempt budget is spent the record is dead
/// even for the correct code.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpRecord {
    pub id: OtpId,

    #[serde(flatten)]
    pub identifier: Identifier,

    /// Hex-encoded SHA-256 of the code
    #[serde(rename = "otp")]
    pub code_hash: String,

    pub purpose: OtpPurpose,

    pub is_used: bool,

    /// Verification attempts claimed so far
    #[serde(default)]
    pub attempts: u32,

    /// Set when a newer code for the same identifier and purpose was issued
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invalidated_at: Option<DateTime<Utc>>,

    pub expires_at: DateTime<Utc>,

    pub created_at: DateTime<Utc>,
}

impl OtpRecord {
    pub fn new(
        identifier: Identifier,
        purpose: OtpPurpose,
        code: &OtpCode,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: OtpId::new(),
            identifier,
            code_hash: Self::hash_code(code.as_str()),
            purpose,
            is_used: false,
            attempts: 0,
            invalidated_at: None,
            expires_at: now + ttl,
            created_at: now,
        }
    }

    /// Generate a fresh code and the record that stores its hash
    pub fn issue(
        identifier: Identifier,
        purpose: OtpPurpose,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> (Self, OtpCode) {
        let code = OtpCode::generate();
        (Self::new(identifier, purpose, &code, ttl, now), code)
    }

    pub fn hash_code(code: &str) -> String {
        hex::encode(Sha256::digest(code.trim().as_bytes()))
    }

    pub fn matches_code(&self, code: &str) -> bool {
        constant_time_eq(Self::hash_code(code).as_bytes(), self.code_hash.as_bytes())
    }

    /// `expires_at` is exclusive
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        !self.is_used && self.invalidated_at.is_none() && !self.is_expired_at(now)
    }

    /// Check every verification condition, then mark the record used
    pub fn consume(
        &mut self,
        code: &str,
        purpose: OtpPurpose,
        now: DateTime<Utc>,
    ) -> Result<(), OtpError> {
        self.check(code, purpose, now)?;
        self.is_used = true;
        Ok(())
    }

    pub fn check(&self, code: &str, purpose: OtpPurpose, now: DateTime<Utc>) -> Result<(), OtpError> {
        if self.is_used {
            return Err(OtpError::AlreadyUsed);
        }
        if self.invalidated_at.is_some() {
            return Err(OtpError::Superseded);
        }
        if self.purpose != purpose {
            return Err(OtpError::PurposeMismatch);
        }
        if self.is_expired_at(now) {
            return Err(OtpError::Expired);
        }
        if !self.matches_code(code) {
            return Err(OtpError::CodeMismatch);
        }
        Ok(())
    }

    /// Take one verification attempt out of `max_attempts`.
    ///
    /// Returns the attempt number. Fails once the record is consumed,
    /// superseded or out of attempts.
    pub fn claim_attempt(&mut self, max_attempts: u32) -> Result<u32, OtpError> {
        if self.is_used {
            return Err(OtpError::AlreadyUsed);
        }
        if self.invalidated_at.is_some() {
            return Err(OtpError::Superseded);
        }
        if self.attempts_exhausted(max_attempts) {
            return Err(OtpError::TooManyAttempts);
        }
        self.attempts += 1;
        Ok(self.attempts)
    }

    pub fn attempts_exhausted(&self, max_attempts: u32) -> bool {
        self.attempts >= max_attempts
    }

    pub fn invalidate(&mut self, now: DateTime<Utc>) {
        if self.invalidated_at.is_none() {
            self.invalidated_at = Some(now);
        }
    }

    pub fn remaining_seconds(&self, now: DateTime<Utc>) -> i64 {
        (self.expires_at - now).num_seconds().max(0)
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Why a code did not verify. Callers collapse all of these into one
/// client-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum OtpError {
    #[error("No active code")]
    NotFound,

    #[error("Code already used")]
    AlreadyUsed,

    #[error("Code superseded by a newer one")]
    Superseded,

    #[error("Code issued for a different purpose")]
    PurposeMismatch,

    #[error("Code expired")]
    Expired,

    #[error("Code does not match")]
    CodeMismatch,

    #[error("Too many verification attempts")]
    TooManyAttempts,
}

impl OtpError {
    pub fn reason(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::AlreadyUsed => "already_used",
            Self::Superseded => "superseded",
            Self::PurposeMismatch => "purpose_mismatch",
            Self::Expired => "expired",
            Self::CodeMismatch => "mismatch",
            Self::TooManyAttempts => "too_many_attempts",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identifier() -> Identifier {
        Identifier::parse("ravi@example.com").unwrap()
    }

    fn record(now: DateTime<Utc>) -> OtpRecord {
        OtpRecord::new(
            identifier(),
            OtpPurpose::Registration,
            &OtpCode::from("482913"),
            Duration::minutes(10),
            now,
        )
    }

    #[test]
    fn test_stores_hash_not_code() {
        let record = record(Utc::now());
        assert_ne!(record.code_hash, "482913");
        assert_eq!(record.code_hash.len(), 64);
        assert!(record.matches_code("482913"));
        assert!(!record.matches_code("482914"));
    }

    #[test]
    fn test_consume_once() {
        let now = Utc::now();
        let mut record = record(now);

        assert!(record.consume("482913", OtpPurpose::Registration, now).is_ok());
        assert!(record.is_used);
        assert_eq!(
            record.consume("482913", OtpPurpose::Registration, now),
            Err(OtpError::AlreadyUsed)
        );
    }

    #[test]
    fn test_expiry_is_exclusive() {
        let now = Utc::now();
        let mut record = record(now);
        let just_before = record.expires_at - Duration::milliseconds(1);

        assert!(record.check("482913", OtpPurpose::Registration, just_before).is_ok());
        assert_eq!(
            record.consume("482913", OtpPurpose::Registration, record.expires_at),
            Err(OtpError::Expired)
        );
        assert!(!record.is_used);
    }

    #[test]
    fn test_purpose_must_match() {
        let now = Utc::now();
        let mut record = record(now);
        assert_eq!(
            record.consume("482913", OtpPurpose::ForgotPassword, now),
            Err(OtpError::PurposeMismatch)
        );
    }

    #[test]
    fn test_wrong_code_within_budget_leaves_record_usable() {
        let now = Utc::now();
        let mut record = record(now);

        assert_eq!(record.claim_attempt(3), Ok(1));
        assert_eq!(
            record.consume("000000", OtpPurpose::Registration, now),
            Err(OtpError::CodeMismatch)
        );
        assert_eq!(record.claim_attempt(3), Ok(2));
        assert!(record.consume("482913", OtpPurpose::Registration, now).is_ok());
    }

    #[test]
    fn test_spent_attempts_lock_out_the_right_code() {
        let now = Utc::now();
        let mut record = record(now);

        for expected in 1..=3 {
            assert_eq!(record.claim_attempt(3), Ok(expected));
            assert_eq!(
                record.check("000000", OtpPurpose::Registration, now),
                Err(OtpError::CodeMismatch)
            );
        }

        assert!(record.attempts_exhausted(3));
        assert_eq!(record.claim_attempt(3), Err(OtpError::TooManyAttempts));
        assert_eq!(record.attempts, 3);
    }

    #[test]
    fn test_invalidated_record_never_verifies() {
        let now = Utc::now();
        let mut record = record(now);
        record.invalidate(now);
        assert!(!record.is_active_at(now));
        assert_eq!(
            record.consume("482913", OtpPurpose::Registration, now),
            Err(OtpError::Superseded)
        );
    }

    #[test]
    fn test_serialized_shape() {
        let record = record(Utc::now());
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["email"], "ravi@example.com");
        assert_eq!(json["otp"], record.code_hash.as_str());
        assert_eq!(json["purpose"], "registration");
        assert_eq!(json["isUsed"], false);
        assert_eq!(json["attempts"], 0);
        assert!(json.get("expiresAt").is_some());
        assert!(json.get("createdAt").is_some());
        assert!(json.get("invalidatedAt").is_none());
        assert!(json.get("phone").is_none());
    }

    #[test]
    fn test_remaining_seconds_floors_at_zero() {
        let now = Utc::now();
        let record = record(now);
        assert_eq!(record.remaining_seconds(now + Duration::hours(1)), 0);
        assert!(record.remaining_seconds(now) > 590);
    }
}
