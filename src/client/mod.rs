// File: ./src/client/mod.rs
pub mod auth;
pub mod cert;
pub mod core;
pub mod error;

pub use crate::client::core::ApiClient;
pub use crate::client::error::ApiError;
