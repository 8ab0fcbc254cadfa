#![warn(missing_docs)]
#![warn(clippy::all)]

//! repofix - clone a GitHub repository, serialize its sources and open issues
//! into a prompt, and ask a language model for a fix.
//!
//! ## Pipeline
//! - [`provisioner`] clones the repository into a scoped working directory,
//!   killing any in-flight clone of the same repository
//! - [`document`] walks the tree into a markdown and a plain-text rendering
//! - [`github`] fetches the first page of open issues, fail-soft
//! - [`prompts`] assembles the change request
//! - [`completion`] sends it to the chat-completion service
//! - [`routes`] exposes the pipeline over HTTP
//!
//! ## Usage
//! ```rust,ignore
//! use repofix::{api::FixIssueRequest, Config, FixerService};
//!
//! async fn example() -> repofix::Result<()> {
//!     let service = FixerService::from_config(Config::load()?)?;
//!     let reply = service
//!         .fix_issue(FixIssueRequest {
//!             github_repo_url: "https://github.com/octo/hello".into(),
//!             custom_changes: String::new(),
//!             issue_number: Some(1),
//!         })
//!         .await?;
//!     println!("{}", reply.response);
//!     Ok(())
//! }
//! ```

/// Request/response schemas and the orchestration service
pub mod api;
/// Persisted artifacts, deferred cleanup and the stale-artifact sweep
pub mod artifacts;
/// Chat-completion client
pub mod completion;
/// Configuration module for the application
pub mod config;
/// Repository-to-document serialization
pub mod document;
/// Error handling types and utilities
pub mod error;
/// GitHub issue fetching and repository references
pub mod github;
/// Logging configuration and utilities
pub mod logging;
/// Change-request prompt assembly
pub mod prompts;
/// Repository cloning and working directories
pub mod provisioner;
/// HTTP router and handlers
pub mod routes;

pub use api::FixerService;
pub use config::Config;
pub use document::{SerializedDocument, TreeSerializer};
pub use error::{Result, ServiceError};
pub use github::{IssueRecord, RepoRef};
