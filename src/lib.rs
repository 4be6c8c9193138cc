//! Shopfront storage backend
//!
//! Users, orders, products and comments held in lazily loaded in-memory
//! tables, persisted as JSON snapshots to a local directory or a GitHub
//! repository with debounced writes.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod routes;
pub mod security;
pub mod services;
pub mod store;
pub mod throttle;

pub use config::Config;
pub use error::{AppError, MediumError, Result, StoreError};
pub use store::Store;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub config: Config,
}

impl AppState {
    /// Create a new AppState with the given store and configuration
    pub fn new(store: Store, config: Config) -> Self {
        Self { store, config }
    }
}
