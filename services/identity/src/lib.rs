//! bhada-identity - accounts, one-time passcodes and the coin wallet

pub mod api;
pub mod application;
pub mod bootstrap;
pub mod domain;
pub mod error;
pub mod infrastructure;

pub use error::{AuthError, AuthResult};
