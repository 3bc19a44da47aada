mod account_dto;
mod auth_dto;

pub use account_dto::*;
pub use auth_dto::*;
