//! Domain layer: entities, value objects, repository ports and domain services

pub mod account;
pub mod auth_flow;
pub mod otp;
pub mod repositories;
pub mod services;
pub mod value_objects;
pub mod wallet;
