use async_trait::async_trait;
use base64::prelude::*;
use reqwest::{header, Client, Response, StatusCode};
use serde::{Deserialize, Serialize};

use super::{table_file_name, Medium};
use crate::config::GitHubConfig;
use crate::constants::GITHUB_USER_AGENT;
use crate::error::MediumError;
use crate::store::TableName;

/// Tables stored as JSON files in a GitHub repository
///
/// Every save is a commit through the contents API, which is rate limited.
/// That is what the store's debounced saver protects.
#[derive(Debug, Clone)]
pub struct GitHubMedium {
    client: Client,
    config: GitHubConfig,
}

/// Subset of the contents API file response
#[derive(Debug, Deserialize)]
struct FileContents {
    sha: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    encoding: String,
}

#[derive(Debug, Serialize)]
struct PutFileRequest<'a> {
    message: String,
    content: String,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<String>,
}

impl GitHubMedium {
    pub fn new(config: GitHubConfig) -> Result<Self, MediumError> {
        let client = Client::builder().user_agent(GITHUB_USER_AGENT).build()?;
        Ok(Self { client, config })
    }

    /// Repository path of a table file, e.g. `data/users.json`
    pub fn table_path(&self, table: TableName) -> String {
        let dir = self.config.tables_path.trim_matches('/');
        if dir.is_empty() {
            table_file_name(table)
        } else {
            format!("{}/{}", dir, table_file_name(table))
        }
    }

    pub fn contents_url(&self, table: TableName) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.config.api_url.trim_end_matches('/'),
            self.config.owner,
            self.config.repo,
            self.table_path(table)
        )
    }

    async fn fetch(&self, table: TableName) -> Result<Option<FileContents>, MediumError> {
        let response = self
            .client
            .get(self.contents_url(table))
            .query(&[("ref", self.config.branch.as_str())])
            .bearer_auth(&self.config.token)
            .header(header::ACCEPT, "application/vnd.github+json")
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let contents = check_status(response).await?.json::<FileContents>().await?;
        Ok(Some(contents))
    }
}

#[async_trait]
impl Medium for GitHubMedium {
    fn name(&self) -> &'static str {
        "github"
    }

    async fn load(&self, table: TableName) -> Result<Option<Vec<u8>>, MediumError> {
        let Some(file) = self.fetch(table).await? else {
            return Ok(None);
        };

        if file.encoding != "base64" {
            return Err(MediumError::Api {
                status: StatusCode::OK.as_u16(),
                message: format!(
                    "{} returned with unsupported encoding '{}'",
                    self.table_path(table),
                    file.encoding
                ),
            });
        }

        Ok(Some(decode_content(&file.content)?))
    }

    async fn save(&self, table: TableName, snapshot: &[u8]) -> Result<(), MediumError> {
        // The contents API needs the current blob SHA to overwrite a file
        let sha = self.fetch(table).await?.map(|file| file.sha);

        let request = PutFileRequest {
            message: format!("Update {} table", table),
            content: BASE64_STANDARD.encode(snapshot),
            branch: &self.config.branch,
            sha,
        };

        let response = self
            .client
            .put(self.contents_url(table))
            .bearer_auth(&self.config.token)
            .header(header::ACCEPT, "application/vnd.github+json")
            .json(&request)
            .send()
            .await?;
        check_status(response).await?;

        tracing::info!("Committed {} to {}", self.table_path(table), self.config.repo);
        Ok(())
    }
}

async fn check_status(response: Response) -> Result<Response, MediumError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response.text().await.unwrap_or_default();
    tracing::warn!("GitHub API returned {}: {}", status, message);
    Err(MediumError::Api {
        status: status.as_u16(),
        message,
    })
}

/// The contents API wraps base64 payloads at 60 columns
fn decode_content(content: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let compact: String = content.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    BASE64_STANDARD.decode(compact)
}
