use bhada_common::UserId;
use bhada_cqrs_core::Command;

use crate::application::dto::{AccountDto, OtpSent};

#[derive(Debug, Clone)]
pub struct SendPhoneOtpCommand {
    pub user_id: UserId,
    pub phone: String,
}

impl Command for SendPhoneOtpCommand {
    type Result = OtpSent;
}

#[derive(Debug, Clone)]
pub struct VerifyPhoneCommand {
    pub user_id: UserId,
    pub phone: String,
    pub otp: String,
}

impl Command for VerifyPhoneCommand {
    type Result = AccountDto;
}
