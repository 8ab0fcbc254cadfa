//! GitHub issue fetching and repository references.

mod repo;

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{Result, ServiceError};

pub use repo::RepoRef;

/// Issues kept from the tracker's first page
pub const MAX_ISSUES: usize = 10;

const API_TIMEOUT_SECS: u64 = 30;

/// Reduced projection of a tracker issue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueRecord {
    /// Issue number within the repository
    pub number: u64,
    /// Issue title
    pub title: String,
    /// Issue body; GitHub sends `null` for empty bodies
    #[serde(default)]
    pub body: Option<String>,
    /// Browser URL of the issue
    pub url: String,
    /// When the issue was opened
    pub created_at: DateTime<Utc>,
    /// Who opened the issue
    pub author: IssueAuthor,
}

/// Author of an issue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueAuthor {
    /// GitHub login
    pub login: String,
    /// Avatar image URL
    pub avatar_url: String,
}

/// Issue as returned by `GET /repos/{owner}/{repo}/issues`
#[derive(Debug, Deserialize)]
struct GitHubIssue {
    number: u64,
    title: String,
    #[serde(default)]
    body: Option<String>,
    html_url: String,
    created_at: DateTime<Utc>,
    user: GitHubUser,
}

#[derive(Debug, Deserialize)]
struct GitHubUser {
    login: String,
    #[serde(default)]
    avatar_url: String,
}

impl From<GitHubIssue> for IssueRecord {
    fn from(issue: GitHubIssue) -> Self {
        Self {
            number: issue.number,
            title: issue.title,
            body: issue.body,
            url: issue.html_url,
            created_at: issue.created_at,
            author: IssueAuthor {
                login: issue.user.login,
                avatar_url: issue.user.avatar_url,
            },
        }
    }
}

/// Client for the GitHub REST API
#[derive(Clone)]
pub struct GitHubClient {
    client: Client,
    api_base: String,
    token: Option<String>,
}

impl GitHubClient {
    /// Creates a client against `api_base`, bearer-authenticated when `token` is set
    pub fn new(api_base: &str, token: Option<String>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("repofix"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));

        let client = Client::builder()
            .timeout(Duration::from_secs(API_TIMEOUT_SECS))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            token,
        })
    }

    /// Creates a client from the service configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.github_api_base, config.api_keys.github_token.clone())
    }

    /// Fetches at most [`MAX_ISSUES`] issues in the tracker's order
    ///
    /// Never fails: transport errors, non-2xx statuses and malformed payloads
    /// are logged and yield an empty list.
    pub async fn fetch_issues(&self, repo: &RepoRef) -> Vec<IssueRecord> {
        match self.try_fetch_issues(repo).await {
            Ok(issues) => {
                debug!("Fetched {} issues for {}", issues.len(), repo);
                issues
            }
            Err(e) => {
                warn!("Failed to fetch issues for {}: {}", repo, e);
                Vec::new()
            }
        }
    }

    async fn try_fetch_issues(&self, repo: &RepoRef) -> Result<Vec<IssueRecord>> {
        let url = format!("{}/repos/{}/{}/issues", self.api_base, repo.owner, repo.name);

        let mut request = self.client.get(&url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(ServiceError::GitHubApi(format!(
                "GET {} failed: HTTP {}",
                url,
                response.status()
            )));
        }

        let issues: Vec<GitHubIssue> = response.json().await?;
        Ok(issues.into_iter().take(MAX_ISSUES).map(IssueRecord::from).collect())
    }
}
