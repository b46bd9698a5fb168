use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info};

/// Registry facts about one package. `Default` is the record for a
/// package the registry does not know.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataRecord {
    pub author_email: Option<String>,
    pub home_page: Option<String>,
    /// Upload time of every file across all releases
    pub release_uploads: Vec<DateTime<Utc>>,
}

impl MetadataRecord {
    pub fn is_empty(&self) -> bool {
        self.author_email.is_none() && self.home_page.is_none() && self.release_uploads.is_empty()
    }

    pub fn last_upload(&self) -> Option<DateTime<Utc>> {
        self.release_uploads.iter().max().copied()
    }
}

#[async_trait]
pub trait RegistryClient: Send + Sync {
    /// Project metadata. An unknown project is an empty record, not an error.
    async fn fetch_project(&self, name: &str) -> Result<MetadataRecord>;

    /// Recent download statistics, as returned by the stats service.
    async fn fetch_recent_downloads(&self, name: &str) -> Result<serde_json::Value>;

    /// Public project page
    fn project_url(&self, name: &str) -> String;

    fn stats_url(&self, name: &str) -> String;
}

#[derive(Debug, Deserialize)]
struct ProjectResponse {
    #[serde(default)]
    info: ProjectInfo,
    #[serde(default)]
    releases: HashMap<String, Vec<ReleaseFile>>,
}

#[derive(Debug, Default, Deserialize)]
struct ProjectInfo {
    author_email: Option<String>,
    home_page: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReleaseFile {
    upload_time_iso_8601: Option<DateTime<Utc>>,
    upload_time: Option<String>,
}

impl ReleaseFile {
    fn uploaded_at(&self) -> Option<DateTime<Utc>> {
        self.upload_time_iso_8601.or_else(|| {
            let raw = self.upload_time.as_deref()?;
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
                .ok()
                .map(|t| t.and_utc())
        })
    }
}

impl From<ProjectResponse> for MetadataRecord {
    fn from(response: ProjectResponse) -> Self {
        let release_uploads = response
            .releases
            .values()
            .flatten()
            .filter_map(ReleaseFile::uploaded_at)
            .collect();
        Self {
            author_email: response.info.author_email,
            home_page: response.info.home_page,
            release_uploads,
        }
    }
}

/// PyPI JSON API plus pypistats.org
pub struct PyPiClient {
    base_url: String,
    stats_url: String,
    client: Client,
}

impl PyPiClient {
    pub fn new(
        base_url: &str,
        stats_url: &str,
        user_agent: &str,
        timeout_secs: u64,
    ) -> Result<Self> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            stats_url: stats_url.trim_end_matches('/').to_string(),
            client: Client::builder()
                .user_agent(user_agent)
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .context("failed to build HTTP client")?,
        })
    }
}

#[async_trait]
impl RegistryClient for PyPiClient {
    async fn fetch_project(&self, name: &str) -> Result<MetadataRecord> {
        let url = format!("{}/pypi/{}/json", self.base_url, name);
        debug!("Fetching registry metadata: {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to send request to {}", url))?;

        if response.status() == StatusCode::NOT_FOUND {
            info!("{} is not on the registry", name);
            return Ok(MetadataRecord::default());
        }
        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            bail!("Registry error {}: {}", status, error_text);
        }

        let project: ProjectResponse = response
            .json()
            .await
            .context("Failed to parse registry metadata")?;
        Ok(project.into())
    }

    async fn fetch_recent_downloads(&self, name: &str) -> Result<serde_json::Value> {
        let url = self.stats_url(name);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to send request to {}", url))?;

        if !response.status().is_success() {
            bail!("Download stats error {} for {}", response.status(), url);
        }

        response
            .json()
            .await
            .context("Failed to parse download stats")
    }

    fn project_url(&self, name: &str) -> String {
        format!("{}/project/{}/", self.base_url, name)
    }

    fn stats_url(&self, name: &str) -> String {
        format!("{}/packages/{}/recent", self.stats_url, name)
    }
}
