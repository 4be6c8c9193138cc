use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::{table_file_name, Medium};
use crate::error::MediumError;
use crate::store::TableName;

/// One JSON file per table under a directory
#[derive(Debug, Clone)]
pub struct LocalMedium {
    dir: PathBuf,
}

impl LocalMedium {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn table_path(&self, table: TableName) -> PathBuf {
        self.dir.join(table_file_name(table))
    }
}

#[async_trait]
impl Medium for LocalMedium {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn load(&self, table: TableName) -> Result<Option<Vec<u8>>, MediumError> {
        match tokio::fs::read(self.table_path(table)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => {
                tracing::error!("Failed to read table {}: {}", table, e);
                Err(e.into())
            }
        }
    }

    async fn save(&self, table: TableName, snapshot: &[u8]) -> Result<(), MediumError> {
        tokio::fs::create_dir_all(&self.dir).await?;

        // Write then rename so the table file never holds a partial snapshot
        let path = self.table_path(table);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, snapshot).await?;
        tokio::fs::rename(&tmp, &path).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_table_loads_as_none() {
        let temp_dir = TempDir::new().unwrap();
        let medium = LocalMedium::new(temp_dir.path());

        assert!(medium.load(TableName::Users).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_creates_directory_and_file() {
        let temp_dir = TempDir::new().unwrap();
        let medium = LocalMedium::new(temp_dir.path().join("nested").join("data"));

        medium.save(TableName::Orders, b"{}").await.unwrap();

        let path = medium.table_path(TableName::Orders);
        assert!(path.ends_with("orders.json"));
        assert_eq!(std::fs::read(&path).unwrap(), b"{}");
        assert!(!path.with_extension("json.tmp").exists());
        assert_eq!(
            medium.load(TableName::Orders).await.unwrap(),
            Some(b"{}".to_vec())
        );
    }
}
