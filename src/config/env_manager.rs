use serde::{Deserialize, Serialize};

/// Stores the credentials for the outbound services
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiKeys {
    /// GitHub bearer token; issues are fetched unauthenticated without it
    pub github_token: Option<String>,
    /// API key for the chat-completion service
    pub completion_api_key: Option<String>,
}

impl ApiKeys {
    /// Loads API keys from the process environment
    ///
    /// `YOUR_API_KEY` is still honoured for deployments that predate `GEMINI_API_KEY`.
    pub fn from_env() -> Self {
        Self {
            github_token: get_env_value("GITHUB_TOKEN"),
            completion_api_key: get_env_value("GEMINI_API_KEY")
                .or_else(|| get_env_value("YOUR_API_KEY")),
        }
    }

    /// Overlays every key that is set in `other`
    pub fn merge(&mut self, other: ApiKeys) {
        if other.github_token.is_some() {
            self.github_token = other.github_token;
        }
        if other.completion_api_key.is_some() {
            self.completion_api_key = other.completion_api_key;
        }
    }
}

/// Reads an environment variable, treating an empty value as unset
pub fn get_env_value(key: &str) -> Option<String> {
    let value = std::env::var(key).ok()?;
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}
