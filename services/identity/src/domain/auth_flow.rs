//! Sign-in step machine
//!
//! Email entry -> OTP or password -> optional password setup. Being signed in
//! is an outcome of a transition, never a stored step.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::value_objects::Email;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthStep {
    #[default]
    Email,
    Otp,
    PasswordLogin,
    PasswordSetup,
}

impl AuthStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Otp => "otp",
            Self::PasswordLogin => "password-login",
            Self::PasswordSetup => "password-setup",
        }
    }

    /// Step after a successful OTP check; `None` means signed in
    pub fn after_otp(needs_password_setup: bool) -> Option<Self> {
        needs_password_setup.then_some(Self::PasswordSetup)
    }
}

impl fmt::Display for AuthStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of looking an email address up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailCheck {
    pub exists: bool,
    pub has_password: bool,
}

impl EmailCheck {
    pub fn next_step(&self) -> AuthStep {
        if self.exists && self.has_password {
            AuthStep::PasswordLogin
        } else {
            AuthStep::Otp
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Step(AuthStep),
    Authenticated,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Cannot {action} from the {from} step")]
pub struct AuthFlowError {
    pub from: AuthStep,
    pub action: &'static str,
}

#[derive(Debug, Clone, Default)]
pub struct AuthFlow {
    step: AuthStep,
    email: Option<Email>,
}

impl AuthFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> AuthStep {
        self.step
    }

    pub fn email(&self) -> Option<&Email> {
        self.email.as_ref()
    }

    pub fn email_checked(
        &mut self,
        email: Email,
        check: EmailCheck,
    ) -> Result<AuthStep, AuthFlowError> {
        self.require(AuthStep::Email, "submit an email")?;
        self.email = Some(email);
        self.step = check.next_step();
        Ok(self.step)
    }

    pub fn use_email_verification(&mut self) -> Result<AuthStep, AuthFlowError> {
        self.require(AuthStep::PasswordLogin, "switch to email verification")?;
        self.step = AuthStep::Otp;
        Ok(self.step)
    }

    pub fn otp_verified(&mut self, needs_password_setup: bool) -> Result<Transition, AuthFlowError> {
        self.require(AuthStep::Otp, "verify a code")?;
        Ok(match AuthStep::after_otp(needs_password_setup) {
            Some(step) => {
                self.step = step;
                Transition::Step(step)
            }
            None => self.finish(),
        })
    }

    pub fn password_accepted(&mut self) -> Result<Transition, AuthFlowError> {
        self.require(AuthStep::PasswordLogin, "sign in with a password")?;
        Ok(self.finish())
    }

    pub fn password_set(&mut self) -> Result<Transition, AuthFlowError> {
        self.require(AuthStep::PasswordSetup, "set a password")?;
        Ok(self.finish())
    }

    pub fn skip_password_setup(&mut self) -> Result<Transition, AuthFlowError> {
        self.require(AuthStep::PasswordSetup, "skip password setup")?;
        Ok(self.finish())
    }

    /// Back to email entry from anywhere
    pub fn go_back(&mut self) -> AuthStep {
        self.step = AuthStep::Email;
        self.email = None;
        self.step
    }

    fn require(&self, expected: AuthStep, action: &'static str) -> Result<(), AuthFlowError> {
        if self.step == expected {
            Ok(())
        } else {
            Err(AuthFlowError {
                from: self.step,
                action,
            })
        }
    }

    // Signed in: the flow is ready for the next sign-in.
    fn finish(&mut self) -> Transition {
        self.go_back();
        Transition::Authenticated
    }
}

/// Fixed-length countdown shown before a code may be resent
#[derive(Debug, Clone, Copy)]
pub struct ResendCountdown {
    duration: Duration,
    started_at: Option<DateTime<Utc>>,
}

impl ResendCountdown {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            started_at: None,
        }
    }

    pub fn start(&mut self, now: DateTime<Utc>) {
        self.started_at = Some(now);
    }

    /// Whole seconds left, rounded up
    pub fn remaining(&self, now: DateTime<Utc>) -> i64 {
        let Some(started_at) = self.started_at else {
            return 0;
        };
        let left = (started_at + self.duration - now).num_milliseconds();
        if left <= 0 { 0 } else { (left + 999) / 1000 }
    }

    pub fn can_resend(&self, now: DateTime<Utc>) -> bool {
        self.remaining(now) == 0
    }
}
