//! Repository provisioning: clone sessions and scoped working directories.
//!
//! Every provisioning request gets its own session directory
//! (`<work_dir>/<session-id>/<repo-name>`). At most one clone per `owner/repo`
//! is in flight: a newer request cancels the older clone, waits until its
//! child process is gone, then starts its own.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{Result, ServiceError};
use crate::github::RepoRef;

/// Tracked handle of an in-flight clone
struct ActiveClone {
    session_id: Uuid,
    /// Cancelled by a newer request for the same repository
    cancel: CancellationToken,
    /// Cancelled once the clone's child process has exited or been killed
    stopped: CancellationToken,
}

/// Clones repositories into per-session working directories
pub struct Provisioner {
    work_dir: PathBuf,
    clone_base: String,
    git_program: String,
    active: Mutex<HashMap<String, ActiveClone>>,
}

impl Provisioner {
    /// Creates a provisioner cloning from `clone_base` into sessions below `work_dir`
    pub fn new(work_dir: PathBuf, clone_base: &str, git_program: &str) -> Self {
        Self {
            work_dir,
            clone_base: clone_base.to_string(),
            git_program: git_program.to_string(),
            active: Mutex::new(HashMap::new()),
        }
    }

    /// Creates a provisioner from the service configuration
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.work_dir.clone(),
            &config.github_clone_base,
            &config.git_program,
        )
    }

    /// Number of clones currently in flight
    pub async fn active_count(&self) -> usize {
        self.active.lock().await.len()
    }

    /// Clones `repo` and returns its working directory
    ///
    /// Supersedes any in-flight clone of the same repository: the older
    /// request fails with [`ServiceError::Superseded`] and its child process is
    /// killed before this clone starts. The returned directory is removed when
    /// released or dropped; on failure nothing is left on disk.
    pub async fn provision(&self, repo: &RepoRef) -> Result<WorkingDirectory> {
        let key = repo.slug();
        let session_id = Uuid::new_v4();
        let cancel = CancellationToken::new();
        let stopped = CancellationToken::new();
        // Signals successors even if this future is dropped mid-clone
        let _stopped_guard = stopped.clone().drop_guard();

        let previous = {
            let mut active = self.active.lock().await;
            active.insert(
                key.clone(),
                ActiveClone {
                    session_id,
                    cancel: cancel.clone(),
                    stopped: stopped.clone(),
                },
            )
        };
        if let Some(previous) = previous {
            info!("Superseding in-flight clone of {} (session {})", repo, previous.session_id);
            previous.cancel.cancel();
            previous.stopped.cancelled().await;
        }

        let session_dir = self.work_dir.join(session_id.to_string());
        let working_dir = WorkingDirectory::new(session_dir, &repo.name);

        let result = self.run_clone(repo, &working_dir, &cancel).await;

        {
            let mut active = self.active.lock().await;
            if active.get(&key).map(|a| a.session_id) == Some(session_id) {
                active.remove(&key);
            }
        }

        result.map(|_| working_dir)
    }

    async fn run_clone(
        &self,
        repo: &RepoRef,
        working_dir: &WorkingDirectory,
        cancel: &CancellationToken,
    ) -> Result<()> {
        if cancel.is_cancelled() {
            return Err(superseded(repo));
        }
        tokio::fs::create_dir_all(&working_dir.session_dir).await?;

        let url = repo.clone_url(&self.clone_base);
        debug!("Cloning {} into {}", url, working_dir.path().display());

        let mut child = Command::new(&self.git_program)
            .arg("clone")
            .arg("--depth")
            .arg("1")
            .arg("--quiet")
            .arg(&url)
            .arg(working_dir.path())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ServiceError::Clone(format!("failed to spawn {}: {}", self.git_program, e)))?;

        let stderr_task = child.stderr.take().map(|mut pipe| {
            tokio::spawn(async move {
                let mut buf = Vec::new();
                let _ = pipe.read_to_end(&mut buf).await;
                String::from_utf8_lossy(&buf).to_string()
            })
        });

        tokio::select! {
            status = child.wait() => {
                let status = status?;
                if status.success() {
                    info!("Cloned {} into {}", repo, working_dir.path().display());
                    return Ok(());
                }
                let stderr = match stderr_task {
                    Some(task) => task.await.unwrap_or_default(),
                    None => String::new(),
                };
                Err(ServiceError::Clone(format!(
                    "git clone of {} exited with {}: {}",
                    url,
                    status,
                    stderr.trim()
                )))
            }
            _ = cancel.cancelled() => {
                let _ = child.kill().await;
                warn!("Killed clone of {}: superseded by a newer request", repo);
                Err(superseded(repo))
            }
        }
    }
}

fn superseded(repo: &RepoRef) -> ServiceError {
    ServiceError::Superseded(format!("clone of {} was superseded by a newer request", repo))
}

/// A cloned working tree, deleted on release or drop
#[derive(Debug)]
pub struct WorkingDirectory {
    session_dir: PathBuf,
    repo_dir: PathBuf,
    released: bool,
}

impl WorkingDirectory {
    fn new(session_dir: PathBuf, repo_name: &str) -> Self {
        let repo_dir = session_dir.join(repo_name);
        Self {
            session_dir,
            repo_dir,
            released: false,
        }
    }

    /// Root of the cloned repository
    pub fn path(&self) -> &Path {
        &self.repo_dir
    }

    /// Deletes the session directory; failures are logged, not returned
    pub async fn release(mut self) {
        self.released = true;
        if let Err(e) = tokio::fs::remove_dir_all(&self.session_dir).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to remove {}: {}", self.session_dir.display(), e);
            }
        }
    }
}

impl Drop for WorkingDirectory {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        let dir = self.session_dir.clone();
        let remove = move || {
            if let Err(e) = std::fs::remove_dir_all(&dir) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!("Failed to remove {}: {}", dir.display(), e);
                }
            }
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(remove);
            }
            Err(_) => remove(),
        }
    }
}
