pub mod admin;
pub mod health;

pub use admin::admin_stats;
pub use health::health_check;

use axum::{routing::get, Router};

use crate::AppState;

/// Operational endpoints served by the binary
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/admin/stats", get(admin_stats))
        .with_state(state)
}
