//! Command and query handlers

mod auth_command_handler;
mod query_handlers;

pub use auth_command_handler::AuthCommandHandler;
pub use query_handlers::{AccountQueryHandler, WalletQueryHandler};
