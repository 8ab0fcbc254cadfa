//! Persisted `generate-files` artifacts and their removal.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;
use tokio::fs;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::document::SerializedDocument;
use crate::error::{Result, ServiceError};
use crate::github::IssueRecord;

/// Suffixes of files written by [`persist`], plus the legacy `.pro` extension
pub const ARTIFACT_SUFFIXES: [&str; 4] = ["issues.json", ".mdx", ".pdf", ".pro"];

/// Paths of one request's persisted artifacts
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactSet {
    /// Markdown rendering, `<repo>.mdx`
    pub mdx: PathBuf,
    /// Rendered document, `<repo>.pdf`
    pub pdf: PathBuf,
    /// Issue list, `<repo>_issues.json`
    pub issues: PathBuf,
}

impl ArtifactSet {
    /// Artifact paths for `repo_name` inside `output_dir`
    pub fn for_repo(output_dir: &Path, repo_name: &str) -> Result<Self> {
        if repo_name.is_empty()
            || repo_name.contains(['/', '\\'])
            || repo_name == "."
            || repo_name == ".."
        {
            return Err(ServiceError::Validation(format!(
                "Invalid artifact name: {}",
                repo_name
            )));
        }
        Ok(Self {
            mdx: output_dir.join(format!("{}.mdx", repo_name)),
            pdf: output_dir.join(format!("{}.pdf", repo_name)),
            issues: output_dir.join(format!("{}_issues.json", repo_name)),
        })
    }

    /// All three paths, for scheduling cleanup
    pub fn paths(&self) -> Vec<PathBuf> {
        vec![self.mdx.clone(), self.pdf.clone(), self.issues.clone()]
    }
}

/// File name component of an artifact path
pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Writes the markdown document, the rendered PDF and the issue list
pub async fn persist(
    output_dir: &Path,
    repo_name: &str,
    document: &SerializedDocument,
    pdf: &[u8],
    issues: &[IssueRecord],
) -> Result<ArtifactSet> {
    let set = ArtifactSet::for_repo(output_dir, repo_name)?;
    fs::create_dir_all(output_dir).await?;
    let issues_json = serde_json::to_vec_pretty(issues)?;

    let contents: [(&Path, &[u8]); 3] = [
        (set.mdx.as_path(), document.markdown.as_bytes()),
        (set.pdf.as_path(), pdf),
        (set.issues.as_path(), issues_json.as_slice()),
    ];
    for (i, (path, bytes)) in contents.iter().enumerate() {
        if let Err(e) = fs::write(path, bytes).await {
            // Only files this call wrote are removed
            for (written, _) in &contents[..i] {
                remove_path(written).await;
            }
            return Err(e.into());
        }
    }

    info!(
        "Wrote artifacts for {} to {}",
        repo_name,
        output_dir.display()
    );
    Ok(set)
}

/// Deletes `paths` once `delay` has elapsed; the caller does not wait
pub fn schedule_cleanup(paths: Vec<PathBuf>, delay: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        for path in &paths {
            remove_path(path).await;
        }
    })
}

/// Removes a file or directory tree, logging failures
pub async fn remove_path(path: &Path) -> bool {
    let result = match fs::symlink_metadata(path).await {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path).await,
        Ok(_) => fs::remove_file(path).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(()) => {
            debug!("Deleted {}", path.display());
            true
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
        Err(e) => {
            warn!("Failed to delete {}: {}", path.display(), e);
            false
        }
    }
}

/// Whether `name` looks like a leftover artifact
pub fn is_artifact_name(name: &str) -> bool {
    ARTIFACT_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
}

/// Deletes leftover artifacts directly inside `dir`
///
/// Returns the matched paths. With `dry_run` nothing is deleted.
pub async fn sweep_artifacts(dir: &Path, dry_run: bool) -> Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir).await?;
    let mut matched = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        if is_artifact_name(&name) {
            matched.push(entry.path());
        }
    }
    matched.sort();

    for path in &matched {
        if dry_run {
            info!("Would delete {}", path.display());
        } else if remove_path(path).await {
            info!("Deleted {}", path.display());
        }
    }
    Ok(matched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use test_case::test_case;

    fn document() -> SerializedDocument {
        SerializedDocument {
            markdown: "# Repository Code\n\n".to_string(),
            plain: String::new(),
            files: Vec::new(),
        }
    }

    #[test_case("hello_issues.json", true)]
    #[test_case("hello.mdx", true)]
    #[test_case("hello.pdf", true)]
    #[test_case("notes.pro", true)]
    #[test_case("hello.json", false)]
    #[test_case("README.md", false)]
    fn test_is_artifact_name(name: &str, expected: bool) {
        assert_eq!(is_artifact_name(name), expected);
    }

    #[test_case("")]
    #[test_case("..")]
    #[test_case("a/b")]
    fn test_rejects_unsafe_names(name: &str) {
        assert!(ArtifactSet::for_repo(Path::new("out"), name).is_err());
    }

    #[tokio::test]
    async fn test_persist_writes_three_files() {
        let temp = TempDir::new().unwrap();
        let set = persist(temp.path(), "hello", &document(), b"%PDF-1.7", &[])
            .await
            .unwrap();

        assert_eq!(file_name(&set.mdx), "hello.mdx");
        assert_eq!(file_name(&set.pdf), "hello.pdf");
        assert_eq!(file_name(&set.issues), "hello_issues.json");
        assert_eq!(std::fs::read_to_string(&set.mdx).unwrap(), "# Repository Code\n\n");
        assert_eq!(std::fs::read_to_string(&set.issues).unwrap(), "[]");
    }

    #[tokio::test]
    async fn test_failed_persist_removes_partial_artifacts() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join("hello.pdf")).unwrap();

        let result = persist(temp.path(), "hello", &document(), b"%PDF", &[]).await;

        assert!(matches!(result, Err(ServiceError::IO(_))));
        assert!(!temp.path().join("hello.mdx").exists());
        assert!(!temp.path().join("hello_issues.json").exists());
        // The occupying directory was not ours to delete
        assert!(temp.path().join("hello.pdf").is_dir());
    }

    #[tokio::test]
    async fn test_schedule_cleanup_removes_after_delay() {
        let temp = TempDir::new().unwrap();
        let set = persist(temp.path(), "hello", &document(), b"%PDF", &[])
            .await
            .unwrap();

        let handle = schedule_cleanup(set.paths(), Duration::from_millis(10));
        assert!(set.mdx.exists());
        handle.await.unwrap();
        assert!(!set.mdx.exists());
        assert!(!set.pdf.exists());
        assert!(!set.issues.exists());
    }

    #[tokio::test]
    async fn test_sweep_dry_run_keeps_files() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("a.mdx"), "").unwrap();
        std::fs::write(temp.path().join("a_issues.json"), "[]").unwrap();
        std::fs::write(temp.path().join("keep.txt"), "").unwrap();

        let matched = sweep_artifacts(temp.path(), true).await.unwrap();
        assert_eq!(matched.len(), 2);
        assert!(temp.path().join("a.mdx").exists());

        sweep_artifacts(temp.path(), false).await.unwrap();
        assert!(!temp.path().join("a.mdx").exists());
        assert!(!temp.path().join("a_issues.json").exists());
        assert!(temp.path().join("keep.txt").exists());
    }
}
