mod env_manager;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::document::classifier::ExtensionPolicy;
use crate::error::{Result, ServiceError};

pub use env_manager::{get_env_value, ApiKeys};

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_CLEANUP_DELAY_SECS: u64 = 5;
const DEFAULT_MAX_DEPTH: usize = 64;
const DEFAULT_GITHUB_API_BASE: &str = "https://api.github.com";
const DEFAULT_GITHUB_CLONE_BASE: &str = "https://github.com";
const DEFAULT_COMPLETION_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_COMPLETION_MODEL: &str = "gemini-1.0-pro";

/// Main configuration struct for the service
///
/// Built from defaults, then an optional TOML file, then the process
/// environment (a `.env` file is loaded into the environment first).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Interface the HTTP server binds to
    pub host: String,
    /// Port the HTTP server listens on
    pub port: u16,
    /// Credentials for GitHub and the completion service
    pub api_keys: ApiKeys,
    /// Base URL of the GitHub REST API
    pub github_api_base: String,
    /// Base URL that `owner/repo` references are cloned from
    pub github_clone_base: String,
    /// Program invoked for `clone`
    pub git_program: String,
    /// Completion service settings
    pub completion: CompletionConfig,
    /// Directory that receives the persisted artifacts
    pub output_dir: PathBuf,
    /// Root under which every clone session gets its own directory
    pub work_dir: PathBuf,
    /// Seconds before persisted artifacts are deleted
    pub cleanup_delay_secs: u64,
    /// Deepest subdirectory level the serializer descends into
    pub max_depth: usize,
    /// Default log level when `RUST_LOG` is not set
    pub log_level: String,
    /// Which files are serialized and which directories are entered
    pub extensions: ExtensionPolicy,
}

/// Settings for the chat-completion endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionConfig {
    /// Base URL of the generative language API
    pub base_url: String,
    /// Model name used in the `models/{model}:generateContent` path
    pub model: String,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_COMPLETION_BASE.to_string(),
            model: DEFAULT_COMPLETION_MODEL.to_string(),
        }
    }
}

impl Config {
    /// Creates a default configuration writing artifacts to `output_dir`
    pub fn new(output_dir: PathBuf) -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            api_keys: ApiKeys::default(),
            github_api_base: DEFAULT_GITHUB_API_BASE.to_string(),
            github_clone_base: DEFAULT_GITHUB_CLONE_BASE.to_string(),
            git_program: "git".to_string(),
            completion: CompletionConfig::default(),
            output_dir,
            work_dir: std::env::temp_dir().join("repofix"),
            cleanup_delay_secs: DEFAULT_CLEANUP_DELAY_SECS,
            max_depth: DEFAULT_MAX_DEPTH,
            log_level: "info".to_string(),
            extensions: ExtensionPolicy::default(),
        }
    }

    /// Loads the full configuration: config file, `.env`, then environment
    pub fn load() -> Result<Self> {
        // A missing .env is the normal case in production
        let _ = dotenvy::dotenv();

        let mut config = match Self::default_config_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };
        config.apply_env()?;
        Ok(config)
    }

    /// Parses a TOML configuration file; absent keys keep their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ServiceError::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        toml::from_str(&content).map_err(|e| {
            ServiceError::Config(format!("Failed to parse config file {}: {}", path.display(), e))
        })
    }

    /// Location of the optional TOML configuration file
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("repofix").join("config.toml"))
    }

    /// Overrides fields from the process environment
    pub fn apply_env(&mut self) -> Result<()> {
        if let Some(port) = get_env_value("PORT") {
            self.port = port
                .trim()
                .parse()
                .map_err(|_| ServiceError::Config(format!("PORT is not a valid port: {}", port)))?;
        }
        if let Some(host) = get_env_value("HOST") {
            self.host = host;
        }
        self.api_keys.merge(ApiKeys::from_env());
        if let Some(base) = get_env_value("GITHUB_API_BASE_URL") {
            self.github_api_base = base;
        }
        if let Some(base) = get_env_value("GITHUB_CLONE_BASE_URL") {
            self.github_clone_base = base;
        }
        if let Some(program) = get_env_value("GIT_PROGRAM") {
            self.git_program = program;
        }
        if let Some(base) = get_env_value("GEMINI_API_BASE_URL") {
            self.completion.base_url = base;
        }
        if let Some(model) = get_env_value("GEMINI_MODEL") {
            self.completion.model = model;
        }
        if let Some(dir) = get_env_value("OUTPUT_DIR") {
            self.output_dir = PathBuf::from(dir);
        }
        if let Some(dir) = get_env_value("WORK_DIR") {
            self.work_dir = PathBuf::from(dir);
        }
        if let Some(secs) = get_env_value("CLEANUP_DELAY_SECS") {
            self.cleanup_delay_secs = secs.trim().parse().map_err(|_| {
                ServiceError::Config(format!("CLEANUP_DELAY_SECS is not a number: {}", secs))
            })?;
        }
        if let Some(depth) = get_env_value("MAX_TREE_DEPTH") {
            self.max_depth = depth.trim().parse().map_err(|_| {
                ServiceError::Config(format!("MAX_TREE_DEPTH is not a number: {}", depth))
            })?;
        }
        if let Some(level) = get_env_value("LOG_LEVEL") {
            self.log_level = level;
        }
        Ok(())
    }

    /// Ensures the artifact and work directories exist
    pub async fn ensure_directories_exist(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.output_dir).await?;
        tokio::fs::create_dir_all(&self.work_dir).await?;
        Ok(())
    }

    /// Delay before persisted artifacts are removed
    pub fn cleanup_delay(&self) -> Duration {
        Duration::from_secs(self.cleanup_delay_secs)
    }

    /// Socket address the server binds to
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| ServiceError::Config(format!("Invalid bind address {}:{}", self.host, self.port)))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(PathBuf::from("output"))
    }
}
