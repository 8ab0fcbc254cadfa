use crate::artifacts::{self, ArtifactSet};
use crate::completion::{CompletionClient, GeminiClient};
use crate::config::Config;
use crate::document::{render, TreeSerializer};
use crate::error::{Result, ServiceError};
use crate::github::{GitHubClient, IssueRecord, RepoRef};
use crate::prompts;
use crate::provisioner::Provisioner;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// Request payload for `POST /generate-files`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateFilesRequest {
    /// Account or organization owning the repository
    pub repo_owner: String,
    /// Repository name
    pub repo_name: String,
}

impl GenerateFilesRequest {
    /// Resolves the repository reference, rejecting blank or malformed fields
    pub fn validate(&self) -> Result<RepoRef> {
        RepoRef::new(&self.repo_owner, &self.repo_name)
    }
}

/// Response for `POST /generate-files`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateFilesResponse {
    /// File name of the markdown rendering
    pub mdx_file: String,
    /// File name of the rendered PDF
    pub pdf_file: String,
    /// File name of the issue list
    pub issues_file: String,
    /// Markdown rendering, inline
    pub mdx_content: String,
    /// Issues fetched from the tracker
    pub issues: Vec<IssueRecord>,
}

impl GenerateFilesResponse {
    fn new(set: &ArtifactSet, mdx_content: String, issues: Vec<IssueRecord>) -> Self {
        Self {
            mdx_file: artifacts::file_name(&set.mdx),
            pdf_file: artifacts::file_name(&set.pdf),
            issues_file: artifacts::file_name(&set.issues),
            mdx_content,
            issues,
        }
    }
}

/// Request payload for `POST /code-changes`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeChangesRequest {
    /// Previously generated markdown rendering
    pub mdx_content: String,
    /// Previously fetched issues
    #[serde(default)]
    pub issues: Vec<IssueRecord>,
    /// Free-text change request
    #[serde(default)]
    pub user_request: String,
}

impl CodeChangesRequest {
    /// Rejects an empty document
    pub fn validate(&self) -> Result<()> {
        if self.mdx_content.trim().is_empty() {
            return Err(ServiceError::Validation("mdxContent must not be empty".into()));
        }
        Ok(())
    }
}

/// Request payload for `POST /fix-issue`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixIssueRequest {
    /// Repository URL or `owner/repo`
    #[serde(rename = "githubRepoURL")]
    pub github_repo_url: String,
    /// Free-text change request
    #[serde(default)]
    pub custom_changes: String,
    /// Issue to fix, if any
    #[serde(default)]
    pub issue_number: Option<u64>,
}

impl FixIssueRequest {
    /// Resolves the repository reference from the URL
    pub fn validate(&self) -> Result<RepoRef> {
        if self.github_repo_url.trim().is_empty() {
            return Err(ServiceError::Validation("githubRepoURL must not be empty".into()));
        }
        RepoRef::parse(&self.github_repo_url).map_err(|e| match e {
            ServiceError::UrlParse(e) => ServiceError::Validation(format!("Invalid githubRepoURL: {}", e)),
            other => other,
        })
    }
}

/// Response carrying the model's reply
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// Reply text from the completion service
    pub response: String,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Service name
    pub service: String,
    /// Service version
    pub version: String,
    /// Current status
    pub status: String,
    /// Current timestamp
    pub timestamp: DateTime<Utc>,
    /// Service uptime in seconds
    pub uptime: u64,
    /// Number of clones currently running
    pub active_clones: usize,
}

/// Wires provisioning, serialization, issue fetching and completion together
pub struct FixerService {
    config: Arc<Config>,
    provisioner: Provisioner,
    serializer: TreeSerializer,
    github: GitHubClient,
    completion: Arc<dyn CompletionClient>,
    start_time: DateTime<Utc>,
}

impl FixerService {
    /// Creates a service with the given completion backend
    pub fn new(config: Config, completion: Arc<dyn CompletionClient>) -> Result<Self> {
        Ok(Self {
            provisioner: Provisioner::from_config(&config),
            serializer: TreeSerializer::from_config(&config),
            github: GitHubClient::from_config(&config)?,
            completion,
            config: Arc::new(config),
            start_time: Utc::now(),
        })
    }

    /// Creates a service backed by the Gemini completion client
    pub fn from_config(config: Config) -> Result<Self> {
        let completion = Arc::new(GeminiClient::from_config(&config)?);
        Self::new(config, completion)
    }

    /// Clones, serializes and persists a repository with its issues
    pub async fn generate_files(&self, request: GenerateFilesRequest) -> Result<GenerateFilesResponse> {
        let repo = request.validate()?;
        info!("Generating files for {}", repo);

        let document = self.serialize_repository(&repo).await?;
        let issues = self.github.fetch_issues(&repo).await;
        let pdf = render::render_pdf(&repo.slug(), &document.plain).await?;

        let set = artifacts::persist(&self.config.output_dir, &repo.name, &document, &pdf, &issues).await?;
        artifacts::schedule_cleanup(set.paths(), self.config.cleanup_delay());

        Ok(GenerateFilesResponse::new(&set, document.markdown, issues))
    }

    /// Asks the model for changes to a previously generated document
    pub async fn code_changes(&self, request: CodeChangesRequest) -> Result<CompletionResponse> {
        request.validate()?;
        let prompt = prompts::compose(
            &request.mdx_content,
            &request.issues,
            None,
            Some(&request.user_request),
        )?;
        self.complete(prompt.as_str()).await
    }

    /// Clones a repository and asks the model to fix an issue or apply custom changes
    pub async fn fix_issue(&self, request: FixIssueRequest) -> Result<CompletionResponse> {
        let repo = request.validate()?;
        info!("Fixing {} (issue: {:?})", repo, request.issue_number);

        let document = self.serialize_repository(&repo).await?;
        let issues = self.github.fetch_issues(&repo).await;
        let prompt = prompts::compose(
            &document.markdown,
            &issues,
            request.issue_number,
            Some(&request.custom_changes),
        )?;
        self.complete(prompt.as_str()).await
    }

    /// Get service health information
    pub async fn health(&self) -> HealthResponse {
        HealthResponse {
            service: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            status: "healthy".to_string(),
            timestamp: Utc::now(),
            uptime: (Utc::now() - self.start_time).num_seconds().max(0) as u64,
            active_clones: self.provisioner.active_count().await,
        }
    }

    async fn serialize_repository(&self, repo: &RepoRef) -> Result<crate::document::SerializedDocument> {
        let working_dir = self.provisioner.provision(repo).await?;
        let result = self.serializer.serialize(working_dir.path()).await;
        working_dir.release().await;

        let document = result?;
        debug!("Serialized {} files from {}", document.files.len(), repo);
        Ok(document)
    }

    async fn complete(&self, prompt: &str) -> Result<CompletionResponse> {
        let response = self.completion.complete(prompt).await?;
        Ok(CompletionResponse { response })
    }
}
