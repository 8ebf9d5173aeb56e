//! ERP Gateway Server
//!
//! The daemon around the engine: configuration, the database password,
//! the HTTP boundary and process lifecycle.

pub mod app;
pub mod config;
pub mod http;
pub mod secrets;

pub use config::{load, ConfigError, GatewayConfig};
pub use http::{router, AppState, HttpSettings};
pub use secrets::{FileSecretStore, SecretStore};
