//! Domain services

mod notification;
mod otp_service;
mod wallet_service;

pub use notification::{OtpNotifier, SmsSender};
pub use otp_service::{IssuedCode, OtpPolicy, OtpService};
pub use wallet_service::{WalletService, WalletSummary};
