//! Repository-to-document serialization.
//!
//! A depth-first, pre-order walk of a working tree that appends every
//! included file into two parallel renderings owned by the top-level call:
//! a markdown document and a plain-text document.

pub mod classifier;
pub mod render;

use std::io;
use std::path::{Path, PathBuf};

use futures::future::BoxFuture;
use tokio::fs as tokio_fs;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::Result;
use classifier::{language_hint, ExtensionPolicy};

/// Title line that opens the markdown rendering
pub const ROOT_TITLE: &str = "# Repository Code\n\n";

/// The two renderings of a repository, built in the same traversal order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SerializedDocument {
    /// Markdown rendering: heading per directory, fenced block per file
    pub markdown: String,
    /// Plain-text rendering: heading per directory, `File Path:`/`Code:` block per file
    pub plain: String,
    /// Relative paths of the included files, in document order
    pub files: Vec<String>,
}

impl SerializedDocument {
    fn new() -> Self {
        Self {
            markdown: ROOT_TITLE.to_string(),
            plain: String::new(),
            files: Vec::new(),
        }
    }

    fn push_directory(&mut self, rel_path: &str) {
        let heading = format!("## {}\n\n", rel_path);
        self.markdown.push_str(&heading);
        self.plain.push_str(&heading);
    }

    fn push_file(&mut self, rel_path: &str, content: &str, language: &str) {
        self.markdown.push_str(&format!(
            "`{}`\n\n```{}\n{}\n```\n\n",
            rel_path, language, content
        ));
        self.plain.push_str(&format!(
            "File Path: {}\n\nCode:\n\n{}\n\n",
            rel_path, content
        ));
        self.files.push(rel_path.to_string());
    }
}

/// Walks a working tree and produces a [`SerializedDocument`]
#[derive(Debug, Clone)]
pub struct TreeSerializer {
    policy: ExtensionPolicy,
    max_depth: usize,
}

impl TreeSerializer {
    /// Creates a serializer with an explicit policy and depth bound
    pub fn new(policy: ExtensionPolicy, max_depth: usize) -> Self {
        Self { policy, max_depth }
    }

    /// Creates a serializer from the service configuration
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.extensions.clone(), config.max_depth)
    }

    /// Serializes everything under `root`
    ///
    /// Any unreadable entry (permissions, non-UTF-8 content) fails the whole
    /// serialization; no partial document is returned.
    pub async fn serialize(&self, root: &Path) -> Result<SerializedDocument> {
        let mut document = SerializedDocument::new();
        self.walk(root, root, 0, &mut document).await?;
        debug!(
            "Serialized {} files from {}",
            document.files.len(),
            root.display()
        );
        Ok(document)
    }

    fn walk<'a>(
        &'a self,
        root: &'a Path,
        dir: &'a Path,
        depth: usize,
        document: &'a mut SerializedDocument,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            for entry in read_sorted(dir).await? {
                let rel_path = relative_path(root, &entry.path);

                if entry.file_type.is_symlink() {
                    debug!("Skipping symlink: {}", rel_path);
                    continue;
                }

                if entry.file_type.is_dir() {
                    if self.policy.is_skipped_dir(&entry.name) {
                        continue;
                    }
                    if depth + 1 > self.max_depth {
                        warn!("Skipping {}: deeper than {} levels", rel_path, self.max_depth);
                        continue;
                    }
                    if !self.is_code_bearing_dir(&entry.path).await? {
                        continue;
                    }
                    document.push_directory(&rel_path);
                    self.walk(root, &entry.path, depth + 1, document).await?;
                } else if entry.file_type.is_file() {
                    if self.policy.is_excluded_file(&entry.name) {
                        continue;
                    }
                    let content = tokio_fs::read_to_string(&entry.path)
                        .await
                        .map_err(|e| io::Error::new(e.kind(), format!("{}: {}", rel_path, e)))?;
                    document.push_file(
                        &rel_path,
                        &collapse_line_breaks(&content),
                        language_hint(&entry.name),
                    );
                }
            }
            Ok(())
        })
    }

    /// Shallow check: does any immediate file carry a code extension
    async fn is_code_bearing_dir(&self, dir: &Path) -> Result<bool> {
        let names = read_sorted(dir)
            .await?
            .into_iter()
            .filter(|entry| entry.file_type.is_file())
            .map(|entry| entry.name);
        Ok(self.policy.is_code_bearing(names))
    }
}

struct DirEntry {
    name: String,
    path: PathBuf,
    file_type: std::fs::FileType,
}

/// Lists a directory sorted by file name so output is identical across platforms
async fn read_sorted(dir: &Path) -> Result<Vec<DirEntry>> {
    let mut read_dir = tokio_fs::read_dir(dir)
        .await
        .map_err(|e| io::Error::new(e.kind(), format!("{}: {}", dir.display(), e)))?;

    let mut entries = Vec::new();
    while let Some(entry) = read_dir.next_entry().await? {
        entries.push(DirEntry {
            name: entry.file_name().to_string_lossy().to_string(),
            path: entry.path(),
            // DirEntry::file_type does not follow symlinks
            file_type: entry.file_type().await?,
        });
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

/// Path of `path` below `root`, always `/`-separated
fn relative_path(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Removes every line-break character, collapsing a file onto one line
pub fn collapse_line_breaks(content: &str) -> String {
    content.chars().filter(|c| *c != '\n' && *c != '\r').collect()
}
