//! Decides which files are serialized and which directories are entered.
//!
//! The two predicates are deliberately independent: `json` counts toward a
//! directory being code-bearing while `.json` files themselves are left out of
//! the document, so a directory holding only `package.json` still gets a
//! heading but no file blocks.

use std::path::Path;

use serde::{Deserialize, Serialize};

const EXCLUDED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "ico", "svg", "md", "json"];
const EXCLUDED_NAMES: &[&str] = &[".gitignore", "package-lock.json"];
const CODE_EXTENSIONS: &[&str] = &["js", "jsx", "ts", "tsx", "py", "css", "json", "sh"];
const SKIPPED_DIRS: &[&str] = &[".git"];

/// Extension and name lists driving the tree serializer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtensionPolicy {
    /// Extensions (without the dot) never included as file content
    pub excluded_extensions: Vec<String>,
    /// Exact file names never included as file content
    pub excluded_names: Vec<String>,
    /// Extensions that make their parent directory code-bearing
    pub code_extensions: Vec<String>,
    /// Directory names that are never entered
    pub skipped_dirs: Vec<String>,
}

impl Default for ExtensionPolicy {
    fn default() -> Self {
        Self {
            excluded_extensions: to_owned(EXCLUDED_EXTENSIONS),
            excluded_names: to_owned(EXCLUDED_NAMES),
            code_extensions: to_owned(CODE_EXTENSIONS),
            skipped_dirs: to_owned(SKIPPED_DIRS),
        }
    }
}

impl ExtensionPolicy {
    /// Returns true if a file with this name must not appear in the document
    pub fn is_excluded_file(&self, name: &str) -> bool {
        if self.excluded_names.iter().any(|n| n == name) {
            return true;
        }
        match extension_of(name) {
            Some(ext) => self.excluded_extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext)),
            None => false,
        }
    }

    /// Returns true if any of the given immediate file names has a code extension
    pub fn is_code_bearing<I, S>(&self, file_names: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        file_names.into_iter().any(|name| {
            extension_of(name.as_ref())
                .map(|ext| self.code_extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext)))
                .unwrap_or(false)
        })
    }

    /// Returns true for directories that are never entered regardless of content
    pub fn is_skipped_dir(&self, name: &str) -> bool {
        self.skipped_dirs.iter().any(|d| d == name)
    }
}

/// Lowercased extension of a file name, without the dot
pub fn extension_of(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// Fence language tag for a file name; empty when unknown
pub fn language_hint(name: &str) -> &'static str {
    match extension_of(name).as_deref() {
        Some("js") | Some("jsx") | Some("mjs") | Some("cjs") => "javascript",
        Some("ts") | Some("tsx") => "typescript",
        Some("py") => "python",
        Some("css") => "css",
        Some("scss") | Some("sass") => "scss",
        Some("html") | Some("htm") => "html",
        Some("sh") | Some("bash") | Some("zsh") => "bash",
        Some("rs") => "rust",
        Some("go") => "go",
        Some("java") => "java",
        Some("rb") => "ruby",
        Some("c") | Some("h") => "c",
        Some("cpp") | Some("cc") | Some("hpp") => "cpp",
        Some("yml") | Some("yaml") => "yaml",
        Some("toml") => "toml",
        Some("json") => "json",
        Some("sql") => "sql",
        _ => "",
    }
}

fn to_owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
