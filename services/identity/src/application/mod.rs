//! Application layer: commands, queries, handlers and the services they drive

pub mod commands;
pub mod dto;
pub mod handlers;
pub mod queries;
pub mod services;
