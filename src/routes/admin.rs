use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::store::TableCounts;
use crate::{error::Result, AppError, AppState};

#[derive(Debug, Deserialize)]
pub struct AdminQuery {
    pub key: String,
}

/// Row counts plus persistence status
#[derive(Debug, Serialize)]
pub struct AdminStatsResponse {
    #[serde(flatten)]
    pub counts: TableCounts,
    pub medium: &'static str,
    pub save_interval_secs: u64,
    pub unsaved_changes: bool,
}

/// GET /admin/stats?key=<admin_secret_key>
///
/// Loads every table that is not cached yet, so the first call after startup
/// costs one medium read per table.
pub async fn admin_stats(
    State(state): State<AppState>,
    Query(params): Query<AdminQuery>,
) -> Result<Json<AdminStatsResponse>> {
    require_admin(&state.config, &params.key)?;

    let counts = state.store.counts().await?;
    tracing::info!(
        "Admin stats: {} users, {} orders, {} products, {} comments",
        counts.users,
        counts.orders,
        counts.products,
        counts.comments
    );

    Ok(Json(AdminStatsResponse {
        counts,
        medium: state.store.medium_name(),
        save_interval_secs: state.config.save_interval_secs,
        unsaved_changes: state.store.has_unsaved_changes().await,
    }))
}

/// Admin routes are closed entirely when no key is configured
fn require_admin(config: &Config, provided: &str) -> Result<()> {
    match config.admin_secret_key.as_deref() {
        Some(expected) if expected == provided => Ok(()),
        Some(_) => {
            tracing::warn!("Rejected admin request with wrong key");
            Err(AppError::Unauthorized)
        }
        None => Err(AppError::Unauthorized),
    }
}
