//! Backing mediums: where table snapshots live between process runs

pub mod github;
pub mod local;

pub use github::GitHubMedium;
pub use local::LocalMedium;

use std::sync::Arc;

use async_trait::async_trait;

use super::TableName;
use crate::config::{Config, StorageBackend};
use crate::constants::TABLE_FILE_EXTENSION;
use crate::error::MediumError;

/// Raw load/save of a table's serialized snapshot
///
/// Implementations only move bytes. Parsing, caching and throttling are the
/// store's job.
#[async_trait]
pub trait Medium: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Read a table snapshot, `None` if the table has never been written
    async fn load(&self, table: TableName) -> Result<Option<Vec<u8>>, MediumError>;

    /// Replace a table snapshot as a whole
    async fn save(&self, table: TableName, snapshot: &[u8]) -> Result<(), MediumError>;
}

/// File name of a table snapshot, e.g. `orders.json`
pub fn table_file_name(table: TableName) -> String {
    format!("{}.{}", table.as_str(), TABLE_FILE_EXTENSION)
}

/// Build the medium selected by the configuration
pub fn from_config(config: &Config) -> Result<Arc<dyn Medium>, MediumError> {
    match &config.storage {
        StorageBackend::Local { path } => {
            tracing::info!("Using local storage at {:?}", path);
            Ok(Arc::new(LocalMedium::new(path)))
        }
        StorageBackend::GitHub(github) => {
            tracing::info!(
                "Using GitHub storage at {}/{}@{}",
                github.owner,
                github.repo,
                github.branch
            );
            Ok(Arc::new(GitHubMedium::new(github.clone())?))
        }
    }
}
