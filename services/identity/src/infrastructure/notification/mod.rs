mod otp_notifier;
mod sms;

pub use otp_notifier::ChannelOtpNotifier;
pub use sms::LoggingSmsSender;
