use std::io;
use thiserror::Error;

/// Custom result type alias for the service
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Errors that can occur while provisioning, serializing and completing a change request
#[derive(Debug, Error)]
pub enum ServiceError {
    /// I/O errors, including unreadable or non-UTF-8 files during traversal
    #[error("IO error: {0}")]
    IO(#[from] io::Error),

    /// HTTP request/response errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing/serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing errors
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Input validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// The clone child process failed or could not be spawned
    #[error("Clone error: {0}")]
    Clone(String),

    /// A newer provisioning request for the same repository killed this one
    #[error("Superseded: {0}")]
    Superseded(String),

    /// GitHub API specific errors
    #[error("GitHub API error: {0}")]
    GitHubApi(String),

    /// Completion service errors (quota, network, policy block, empty reply)
    #[error("Completion error: {0}")]
    Completion(String),

    /// Rendered document errors
    #[error("Render error: {0}")]
    Render(String),
}

impl ServiceError {
    /// Checks if this error came from a flaky dependency rather than bad input
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Http(_) | Self::IO(_) | Self::Clone(_))
    }

    /// Checks if this error was caused by the caller's request
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::UrlParse(_))
    }
}
