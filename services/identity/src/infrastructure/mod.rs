//! Infrastructure: persistence, delivery channels and background tasks

pub mod cleanup;
pub mod notification;
pub mod persistence;
