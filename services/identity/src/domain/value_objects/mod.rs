//! Value objects

mod email;
mod password;
mod phone;

pub use email::{Email, EmailError};
pub use password::{HashedPassword, Password, PasswordError};
pub use phone::{Phone, PhoneError};
