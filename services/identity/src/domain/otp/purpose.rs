use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Why a code was issued. A code only verifies for the purpose it was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OtpPurpose {
    Registration,
    ForgotPassword,
    PhoneVerification,
}

impl OtpPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Registration => "registration",
            Self::ForgotPassword => "forgot_password",
            Self::PhoneVerification => "phone_verification",
        }
    }

    /// Whether codes for this purpose are sent to an email address
    pub fn is_email_purpose(&self) -> bool {
        !matches!(self, Self::PhoneVerification)
    }
}

impl fmt::Display for OtpPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OtpPurpose {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "registration" => Ok(Self::Registration),
            "forgot_password" => Ok(Self::ForgotPassword),
            "phone_verification" => Ok(Self::PhoneVerification),
            other => Err(format!("Unknown OTP purpose: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_forms_agree() {
        for purpose in [
            OtpPurpose::Registration,
            OtpPurpose::ForgotPassword,
            OtpPurpose::PhoneVerification,
        ] {
            assert_eq!(purpose.as_str().parse::<OtpPurpose>().unwrap(), purpose);
            let json = serde_json::to_string(&purpose).unwrap();
            assert_eq!(json, format!("\"{}\"", purpose.as_str()));
        }
        assert!("signup".parse::<OtpPurpose>().is_err());
    }
}
