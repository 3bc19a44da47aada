//! bhada-adapter-postgres - PostgreSQL adapter

mod connection;
mod error_mapper;

pub use connection::*;
pub use error_mapper::*;
