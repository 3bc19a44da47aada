//! Periodic removal of expired OTP records

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::domain::services::OtpService;

pub struct CleanupTask {
    otp: Arc<OtpService>,
    interval: Duration,
}

impl CleanupTask {
    pub fn new(otp: Arc<OtpService>, interval: Duration) -> Self {
        Self { otp, interval }
    }

    pub fn start(self: Arc<Self>, shutdown: CancellationToken) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            info!(interval_secs = self.interval.as_secs(), "Cleanup task started");
            let mut ticker = interval(self.interval);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        self.run_once().await;
                    }
                    _ = shutdown.cancelled() => {
                        info!("Cleanup task received shutdown signal");
                        break;
                    }
                }
            }
            info!("Cleanup task stopped");
        })
    }

    pub async fn run_once(&self) -> u64 {
        match self.otp.cleanup_expired(Utc::now()).await {
            Ok(deleted) => deleted,
            Err(e) => {
                error!(error = %e, "Failed to remove expired OTP records");
                0
            }
        }
    }
}
