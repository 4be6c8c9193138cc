use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{DEFAULT_GITHUB_API_URL, DEFAULT_SAVE_INTERVAL_SECS};

/// Repository that holds table snapshots
#[derive(Clone)]
pub struct GitHubConfig {
    pub api_url: String,
    pub owner: String,
    pub repo: String,
    pub branch: String,
    /// Directory inside the repository holding `<table>.json` files
    pub tables_path: String,
    pub token: String,
}

impl fmt::Debug for GitHubConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitHubConfig")
            .field("api_url", &self.api_url)
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("branch", &self.branch)
            .field("tables_path", &self.tables_path)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Where table snapshots are persisted
#[derive(Debug, Clone)]
pub enum StorageBackend {
    Local { path: PathBuf },
    GitHub(GitHubConfig),
}

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub allowed_origins: Vec<String>,
    pub environment: String,
    pub storage: StorageBackend,
    pub save_interval_secs: u64,
    pub password_pepper: String,
    /// Admin endpoints are disabled when unset
    pub admin_secret_key: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if it exists (development)
        dotenvy::dotenv().ok();

        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|_| "Invalid SERVER_PORT")?;

        let allowed_origins = env::var("ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let storage = storage_from_env()?;

        let save_interval_secs = env::var("SAVE_INTERVAL_SECS")
            .unwrap_or_else(|_| DEFAULT_SAVE_INTERVAL_SECS.to_string())
            .parse()
            .map_err(|_| "Invalid SAVE_INTERVAL_SECS")?;

        let password_pepper = env::var("PASSWORD_PEPPER")
            .map_err(|_| "PASSWORD_PEPPER must be set for password hashing")?;

        let admin_secret_key = env::var("ADMIN_SECRET_KEY")
            .ok()
            .filter(|key| !key.is_empty());

        Ok(Config {
            server_host,
            server_port,
            allowed_origins,
            environment,
            storage,
            save_interval_secs,
            password_pepper,
            admin_secret_key,
        })
    }

    /// Get server address as string
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    pub fn save_interval(&self) -> Duration {
        Duration::from_secs(self.save_interval_secs)
    }
}

fn storage_from_env() -> Result<StorageBackend, String> {
    let storage_type = env::var("STORAGE_TYPE").unwrap_or_else(|_| "local".to_string());

    match storage_type.as_str() {
        "local" => {
            let path = env::var("STORAGE_PATH").unwrap_or_else(|_| "./data".to_string());
            Ok(StorageBackend::Local {
                path: PathBuf::from(path),
            })
        }
        "github" => {
            let required = |key: &str| {
                env::var(key)
                    .ok()
                    .filter(|value| !value.is_empty())
                    .ok_or_else(|| format!("{} must be set for GitHub storage", key))
            };

            Ok(StorageBackend::GitHub(GitHubConfig {
                api_url: env::var("GITHUB_API_URL")
                    .unwrap_or_else(|_| DEFAULT_GITHUB_API_URL.to_string()),
                owner: required("GITHUB_OWNER")?,
                repo: required("GITHUB_REPO")?,
                branch: env::var("GITHUB_BRANCH").unwrap_or_else(|_| "main".to_string()),
                tables_path: env::var("GITHUB_TABLES_PATH").unwrap_or_else(|_| "tables".to_string()),
                token: required("GITHUB_API_TOKEN")?,
            }))
        }
        other => Err(format!(
            "Unsupported STORAGE_TYPE '{}' (expected 'local' or 'github')",
            other
        )),
    }
}
