//! Follow service HTTP layer: configuration and Axum routes.

pub mod config;
pub mod server;
