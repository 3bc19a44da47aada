//! bhada-common - shared types and helpers

pub mod types;
pub mod utils;

pub use types::*;
pub use utils::*;
