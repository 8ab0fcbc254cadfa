use std::fmt;

use url::Url;

use crate::error::{Result, ServiceError};

/// An `owner/name` pair identifying a GitHub repository
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoRef {
    /// Account or organization owning the repository
    pub owner: String,
    /// Repository name, without any `.git` suffix
    pub name: String,
}

impl RepoRef {
    /// Builds a reference from separate owner and name fields
    pub fn new(owner: &str, name: &str) -> Result<Self> {
        let owner = owner.trim();
        let name = name.trim();
        let name = name.strip_suffix(".git").unwrap_or(name);
        validate_segment("owner", owner)?;
        validate_segment("repository name", name)?;
        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }

    /// Parses `owner/repo`, an `https://` repository URL or a `git@host:owner/repo` remote
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim().trim_end_matches('/');

        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            let url = Url::parse(trimmed)?;
            let segments: Vec<&str> = url
                .path_segments()
                .ok_or_else(|| ServiceError::Validation(format!("Invalid repository URL: {}", input)))?
                .filter(|s| !s.is_empty())
                .collect();
            if segments.len() < 2 {
                return Err(ServiceError::Validation(format!(
                    "Repository URL must name an owner and a repository: {}",
                    input
                )));
            }
            return Self::new(segments[0], segments[1]);
        }

        let path = match trimmed.split_once(':') {
            Some((host, path)) if host.contains('@') => path,
            _ => trimmed,
        };
        let (owner, name) = path.split_once('/').ok_or_else(|| {
            ServiceError::Validation(format!("Expected owner/repo or a repository URL, got: {}", input))
        })?;
        if name.contains('/') {
            return Err(ServiceError::Validation(format!(
                "Expected owner/repo or a repository URL, got: {}",
                input
            )));
        }
        Self::new(owner, name)
    }

    /// `owner/name`, the key used for supersession
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    /// Clone URL below `base`, e.g. `https://github.com/owner/name.git`
    pub fn clone_url(&self, base: &str) -> String {
        format!("{}/{}/{}.git", base.trim_end_matches('/'), self.owner, self.name)
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

fn validate_segment(what: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(ServiceError::Validation(format!("GitHub {} is empty", what)));
    }
    if value == "." || value == ".." {
        return Err(ServiceError::Validation(format!("GitHub {} is invalid: {}", what, value)));
    }
    let valid = value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.');
    if !valid {
        return Err(ServiceError::Validation(format!(
            "GitHub {} contains invalid characters: {}",
            what, value
        )));
    }
    Ok(())
}
