//! Commands

mod auth_commands;
mod phone_commands;

pub use auth_commands::*;
pub use phone_commands::*;
