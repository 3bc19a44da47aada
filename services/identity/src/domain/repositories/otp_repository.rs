use async_trait::async_trait;
use bhada_common::OtpId;
use bhada_errors::AppResult;
use chrono::{DateTime, Utc};

use crate::domain::otp::{Identifier, IssueOutcome, IssueThrottle, OtpPurpose, OtpRecord};

#[async_trait]
pub trait OtpRepository: Send + Sync {
    async fn save(&self, record: &OtpRecord) -> AppResult<()>;

    /// Apply `throttle` to the record's identifier and purpose, supersede the
    /// active records for the pair and store `record`, as one step.
    ///
    /// Concurrent calls for the same pair are serialized, so at most one of
    /// them can pass a cooldown.
    async fn issue(&self, record: &OtpRecord, throttle: &IssueThrottle) -> AppResult<IssueOutcome>;

    /// Newest record for the pair that is unused, not superseded and not expired at `now`
    async fn find_latest_active(
        &self,
        identifier: &Identifier,
        purpose: OtpPurpose,
        now: DateTime<Utc>,
    ) -> AppResult<Option<OtpRecord>>;

    /// Increment the attempt counter if the record is unused, not superseded
    /// and below `max_attempts`. Returns the new count, or `None` when no
    /// attempt could be claimed.
    async fn claim_attempt(&self, id: &OtpId, max_attempts: u32) -> AppResult<Option<u32>>;

    /// Flip `is_used` only if the record is still unused and not superseded.
    /// Returns `false` when another caller got there first.
    async fn mark_used(&self, id: &OtpId) -> AppResult<bool>;

    async fn delete(&self, id: &OtpId) -> AppResult<()>;

    /// Delete records expired at `expired_before` that were also created
    /// before `created_before`. Records still inside the issuance window are
    /// kept so they keep counting toward the cap.
    async fn delete_expired(
        &self,
        expired_before: DateTime<Utc>,
        created_before: DateTime<Utc>,
    ) -> AppResult<u64>;
}
