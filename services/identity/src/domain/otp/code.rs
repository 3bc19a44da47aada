use rand::Rng;
use std::fmt;

/// Plain-text six digit code. Only ever handed to the delivery channel.
#[derive(Clone, PartialEq, Eq)]
pub struct OtpCode(String);

impl OtpCode {
    pub const LENGTH: usize = 6;

    /// Uniformly random in `000000..=999999`
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        Self(format!("{:06}", rng.gen_range(0..1_000_000)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for OtpCode {
    fn from(code: &str) -> Self {
        Self(code.to_string())
    }
}

impl fmt::Debug for OtpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OtpCode(******)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_codes_are_six_digits() {
        for _ in 0..200 {
            let code = OtpCode::generate();
            assert_eq!(code.as_str().len(), OtpCode::LENGTH);
            assert!(code.as_str().chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_debug_hides_code() {
        assert_eq!(format!("{:?}", OtpCode::from("123456")), "OtpCode(******)");
    }
}
