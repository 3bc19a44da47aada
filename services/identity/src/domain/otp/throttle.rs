//! Issuance throttling rules

use chrono::{DateTime, Duration, Utc};

/// Resend cooldown plus a cap on codes per rolling window, both per
/// identifier and purpose
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IssueThrottle {
    pub cooldown: Duration,
    /// Zero disables the cap
    pub max_per_window: u32,
    pub window: Duration,
}

impl IssueThrottle {
    pub fn window_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.window
    }

    /// Decide whether one more code may be issued, given the newest existing
    /// record and how many were created since `window_start(now)`
    pub fn check(
        &self,
        latest_created_at: Option<DateTime<Utc>>,
        issued_in_window: u64,
        now: DateTime<Utc>,
    ) -> Result<(), Throttled> {
        if self.cooldown > Duration::zero() {
            if let Some(latest) = latest_created_at {
                let elapsed = now - latest;
                if elapsed < self.cooldown {
                    let left_ms = (self.cooldown - elapsed).num_milliseconds();
                    return Err(Throttled::Cooldown {
                        retry_after_secs: ((left_ms + 999) / 1000).max(1),
                    });
                }
            }
        }

        if self.max_per_window > 0 && issued_in_window >= u64::from(self.max_per_window) {
            return Err(Throttled::RateLimited {
                retry_after_secs: self.window.num_seconds(),
            });
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Throttled {
    Cooldown { retry_after_secs: i64 },
    RateLimited { retry_after_secs: i64 },
}

impl Throttled {
    pub fn rule(&self) -> &'static str {
        match self {
            Self::Cooldown { .. } => "cooldown",
            Self::RateLimited { .. } => "hourly_cap",
        }
    }
}

/// Result of an atomic throttle-check-and-insert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueOutcome {
    /// Stored; `superseded` earlier active records were invalidated
    Issued { superseded: u64 },
    Throttled(Throttled),
}
