//! bhada-cqrs-core - command/query traits
//!
//! Handlers pick their own error type so that domain error codes survive
//! all the way to the transport layer.

mod command;
mod query;

pub use command::*;
pub use query::*;
