//! Repository ports

mod account_repository;
mod otp_repository;
mod wallet_repository;

pub use account_repository::*;
pub use otp_repository::*;
pub use wallet_repository::*;
