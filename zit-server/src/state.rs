//! Application state shared across handlers

use std::sync::Arc;

use zit_core::{Config, DatabaseAccessor};

/// Shared application state, handed to the router as `Arc<AppState>`.
pub struct AppState {
    pub db: DatabaseAccessor,
    pub config: Config,
}

impl AppState {
    /// Build the state; the accessor is created but not connected.
    pub fn new(config: Config) -> Arc<Self> {
        Arc::new(Self {
            db: DatabaseAccessor::new(config.db.clone()),
            config,
        })
    }
}
