use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::models::User;
use crate::AppState;

/// Health check endpoint
///
/// Reports whether the backing medium is reachable. The first call loads the
/// `users` table; afterwards it is answered from memory without copying rows.
pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let storage_status = match state.store.preload::<User>().await {
        Ok(_) => "connected",
        Err(e) => {
            tracing::error!("Storage health check failed: {}", e);
            "disconnected"
        }
    };

    Json(json!({
        "status": if storage_status == "connected" { "healthy" } else { "unhealthy" },
        "storage": storage_status,
        "medium": state.store.medium_name(),
        "unsaved_changes": state.store.has_unsaved_changes().await,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
