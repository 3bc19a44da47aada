//! One-time passcodes

mod code;
mod identifier;
mod otp_record;
mod purpose;
mod throttle;

pub use code::OtpCode;
pub use identifier::{Identifier, IdentifierError};
pub use otp_record::{OtpError, OtpRecord};
pub use purpose::OtpPurpose;
pub use throttle::{IssueOutcome, IssueThrottle, Throttled};
