//! Core of the zit signal-timing backend: configuration, scoped
//! database sessions, bearer-token identity and the persistence layer.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod repos;

pub use config::{AppConfig, AuthConfig, Config, ConfigError, DatabaseConfig};
pub use db::{DatabaseAccessor, Session};
pub use error::{AuthError, DbError, DbResult};
