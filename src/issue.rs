use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Source of support-request text
#[async_trait]
pub trait IssueSource: Send + Sync {
    async fn fetch_body(&self, number: u64) -> Result<String>;

    /// API URL of an issue, exposed to templates as `SUPPORT_ISSUE_URL`
    fn issue_url(&self, number: u64) -> String;
}

#[derive(Debug, Deserialize)]
struct IssueResponse {
    body: Option<String>,
}

/// GitHub REST issues endpoint for one repository
pub struct GitHubIssues {
    api_url: String,
    repo: String,
    client: Client,
}

impl GitHubIssues {
    pub fn new(api_url: &str, repo: &str, user_agent: &str, timeout_secs: u64) -> Result<Self> {
        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            repo: repo.trim_matches('/').to_string(),
            client: Client::builder()
                .user_agent(user_agent)
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .context("failed to build HTTP client")?,
        })
    }
}

#[async_trait]
impl IssueSource for GitHubIssues {
    async fn fetch_body(&self, number: u64) -> Result<String> {
        let url = self.issue_url(number);
        debug!("Fetching issue: {}", url);

        let response = self
            .client
            .get(&url)
            .header("accept", "application/vnd.github+json")
            .send()
            .await
            .with_context(|| format!("Failed to send request to {}", url))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            bail!("GitHub API error {} for issue #{}: {}", status, number, error_text);
        }

        let issue: IssueResponse = response
            .json()
            .await
            .context("Failed to parse GitHub issue")?;
        Ok(issue.body.unwrap_or_default())
    }

    fn issue_url(&self, number: u64) -> String {
        format!("{}/repos/{}/issues/{}", self.api_url, self.repo, number)
    }
}
