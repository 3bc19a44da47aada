//! OTP issuance and verification

use std::sync::Arc;

use bhada_common::OtpId;
use bhada_config::OtpConfig;
use bhada_errors::AppResult;
use chrono::{DateTime, Duration, Utc};
use metrics::counter;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::otp::{
    Identifier, IssueOutcome, IssueThrottle, OtpError, OtpPurpose, OtpRecord,
};
use crate::domain::repositories::OtpRepository;
use crate::domain::services::OtpNotifier;
use crate::error::{AuthError, AuthResult};

/// Rolling window the hourly cap counts over
const RATE_WINDOW_SECS: i64 = 3600;

/// Issuance limits
#[derive(Debug, Clone, Copy)]
pub struct OtpPolicy {
    pub code_ttl: Duration,
    /// Zero disables the cooldown
    pub resend_cooldown: Duration,
    /// Zero disables the hourly cap
    pub max_requests_per_hour: u32,
    /// Verification attempts per code, the correct one included
    pub max_attempts: u32,
}

impl Default for OtpPolicy {
    fn default() -> Self {
        Self::from(&OtpConfig::default())
    }
}

impl From<&OtpConfig> for OtpPolicy {
    fn from(config: &OtpConfig) -> Self {
        Self {
            code_ttl: Duration::minutes(config.code_ttl_minutes),
            resend_cooldown: Duration::seconds(config.resend_cooldown_secs),
            max_requests_per_hour: config.max_requests_per_hour,
            max_attempts: config.max_attempts,
        }
    }
}

impl OtpPolicy {
    pub fn throttle(&self) -> IssueThrottle {
        IssueThrottle {
            cooldown: self.resend_cooldown,
            max_per_window: self.max_requests_per_hour,
            window: Duration::seconds(RATE_WINDOW_SECS),
        }
    }
}

/// What the caller learns about a code it just had sent
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedCode {
    #[serde(skip)]
    pub otp_id: OtpId,
    pub expires_at: DateTime<Utc>,
    pub expires_in_secs: i64,
    pub resend_after_secs: i64,
}

pub struct OtpService {
    repo: Arc<dyn OtpRepository>,
    notifier: Arc<dyn OtpNotifier>,
    policy: OtpPolicy,
}

impl OtpService {
    pub fn new(
        repo: Arc<dyn OtpRepository>,
        notifier: Arc<dyn OtpNotifier>,
        policy: OtpPolicy,
    ) -> Self {
        Self {
            repo,
            notifier,
            policy,
        }
    }

    pub fn policy(&self) -> &OtpPolicy {
        &self.policy
    }

    /// Issue and deliver a new code, superseding any outstanding one
    pub async fn request_code(
        &self,
        identifier: &Identifier,
        purpose: OtpPurpose,
    ) -> AuthResult<IssuedCode> {
        let now = Utc::now();
        debug!(identifier = %identifier.masked(), purpose = %purpose, "OTP requested");

        let (record, code) =
            OtpRecord::issue(identifier.clone(), purpose, self.policy.code_ttl, now);

        let superseded = match self.repo.issue(&record, &self.policy.throttle()).await? {
            IssueOutcome::Issued { superseded } => superseded,
            IssueOutcome::Throttled(throttled) => {
                self.throttled(identifier, purpose, throttled.rule());
                return Err(throttled.into());
            }
        };

        if let Err(e) = self
            .notifier
            .deliver(
                identifier,
                &code,
                purpose,
                self.policy.code_ttl.num_minutes(),
            )
            .await
        {
            warn!(
                identifier = %identifier.masked(),
                purpose = %purpose,
                error = %e,
                "OTP delivery failed, discarding code"
            );
            if let Err(cleanup) = self.repo.delete(&record.id).await {
                warn!(otp_id = %record.id, error = %cleanup, "Failed to discard undelivered code");
            }
            return Err(AuthError::DeliveryFailed(e));
        }

        counter!("otp_issued_total", "purpose" => purpose.as_str()).increment(1);
        info!(
            otp_id = %record.id,
            identifier = %identifier.masked(),
            purpose = %purpose,
            superseded,
            expires_at = %record.expires_at,
            "OTP issued"
        );

        Ok(IssuedCode {
            otp_id: record.id.clone(),
            expires_at: record.expires_at,
            expires_in_secs: record.remaining_seconds(now),
            resend_after_secs: self.policy.resend_cooldown.num_seconds().max(0),
        })
    }

    /// Same rules as a first request; the cooldown is what the client counts down
    pub async fn resend_code(
        &self,
        identifier: &Identifier,
        purpose: OtpPurpose,
    ) -> AuthResult<IssuedCode> {
        self.request_code(identifier, purpose).await
    }

    /// Consume the newest active code. Every check claims one of the code's
    /// attempts; every failure is reported as `InvalidOtp`.
    pub async fn verify_code(
        &self,
        identifier: &Identifier,
        code: &str,
        purpose: OtpPurpose,
    ) -> AuthResult<OtpRecord> {
        let now = Utc::now();

        let Some(mut record) = self
            .repo
            .find_latest_active(identifier, purpose, now)
            .await?
        else {
            return Err(self.reject(identifier, purpose, OtpError::NotFound));
        };

        let max_attempts = self.policy.max_attempts;
        let Some(attempts) = self.repo.claim_attempt(&record.id, max_attempts).await? else {
            return Err(self.reject(identifier, purpose, OtpError::TooManyAttempts));
        };
        record.attempts = attempts;

        if let Err(e) = record.consume(code, purpose, now) {
            if record.attempts_exhausted(max_attempts) {
                warn!(
                    otp_id = %record.id,
                    identifier = %identifier.masked(),
                    purpose = %purpose,
                    attempts,
                    "OTP attempts exhausted, code locked"
                );
            }
            return Err(self.reject(identifier, purpose, e));
        }

        if !self.repo.mark_used(&record.id).await? {
            return Err(self.reject(identifier, purpose, OtpError::AlreadyUsed));
        }

        counter!("otp_verified_total", "purpose" => purpose.as_str()).increment(1);
        info!(otp_id = %record.id, identifier = %identifier.masked(), purpose = %purpose, "OTP verified");

        Ok(record)
    }

    /// Delete records that expired before `now` and have left the rate window
    pub async fn cleanup_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let window_start = self.policy.throttle().window_start(now);
        let deleted = self.repo.delete_expired(now, window_start).await?;
        if deleted > 0 {
            info!(deleted, "Expired OTP records removed");
        }
        Ok(deleted)
    }

    fn throttled(&self, identifier: &Identifier, purpose: OtpPurpose, rule: &'static str) {
        counter!("otp_throttled_total", "purpose" => purpose.as_str(), "rule" => rule)
            .increment(1);
        warn!(identifier = %identifier.masked(), purpose = %purpose, rule, "OTP request throttled");
    }

    fn reject(&self, identifier: &Identifier, purpose: OtpPurpose, reason: OtpError) -> AuthError {
        counter!("otp_rejected_total", "purpose" => purpose.as_str(), "reason" => reason.reason())
            .increment(1);
        debug!(
            identifier = %identifier.masked(),
            purpose = %purpose,
            reason = reason.reason(),
            "OTP rejected"
        );
        reason.into()
    }
}
