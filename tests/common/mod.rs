#![allow(dead_code)]

use std::path::{Path, PathBuf};

pub mod test_helpers {
    use super::*;
    use async_trait::async_trait;
    use repofix::completion::CompletionClient;
    use repofix::config::Config;
    use std::process::Command;
    use std::sync::Mutex;

    pub fn setup_test_logger() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("repofix=debug")
            .with_test_writer()
            .try_init();
    }

    /// Writes `files` (relative path, content) below `root`, creating parents
    pub fn write_tree(root: &Path, files: &[(&str, &[u8])]) {
        for (rel, content) in files {
            let path = root.join(rel);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).unwrap();
            }
            std::fs::write(path, content).unwrap();
        }
    }

    pub fn git_available() -> bool {
        Command::new("git")
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn git(dir: &Path, args: &[&str]) {
        let status = Command::new("git")
            .args(["-c", "user.name=repofix", "-c", "user.email=repofix@example.com"])
            .args(args)
            .current_dir(dir)
            .output()
            .unwrap();
        assert!(status.status.success(), "git {:?} failed: {:?}", args, status);
    }

    /// Creates `<base>/<owner>/<name>.git` holding one commit of `files`
    ///
    /// Returns the `file://` base URL to clone from.
    pub fn create_remote(base: &Path, owner: &str, name: &str, files: &[(&str, &[u8])]) -> String {
        let repo = base.join(owner).join(format!("{}.git", name));
        std::fs::create_dir_all(&repo).unwrap();
        write_tree(&repo, files);
        git(&repo, &["init", "--quiet"]);
        git(&repo, &["add", "."]);
        git(&repo, &["commit", "--quiet", "-m", "initial"]);
        format!("file://{}", base.display())
    }

    /// Configuration rooted in `root` with every outbound base pointed at test doubles
    pub fn create_test_config(root: &Path, github_api_base: &str, clone_base: &str) -> Config {
        let mut config = Config::new(root.join("output"));
        config.work_dir = root.join("work");
        config.github_api_base = github_api_base.to_string();
        config.github_clone_base = clone_base.to_string();
        config.cleanup_delay_secs = 3600;
        config
    }

    /// Sample tracker payload with `count` issues numbered from 1
    pub fn issues_json(count: u64) -> String {
        let issues: Vec<_> = (1..=count)
            .map(|n| {
                serde_json::json!({
                    "number": n,
                    "title": format!("Issue {}", n),
                    "body": format!("Body of issue {}", n),
                    "html_url": format!("https://github.com/octo/hello/issues/{}", n),
                    "created_at": "2024-03-01T10:00:00Z",
                    "state": "open",
                    "user": {"login": "mona", "avatar_url": "https://avatars.example/mona", "id": 1}
                })
            })
            .collect();
        serde_json::Value::Array(issues).to_string()
    }

    /// Completion double that records prompts and answers with a fixed reply
    pub struct MockCompletion {
        reply: String,
        pub prompts: Mutex<Vec<String>>,
    }

    impl MockCompletion {
        pub fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub fn last_prompt(&self) -> Option<String> {
            self.prompts.lock().unwrap().last().cloned()
        }
    }

    #[async_trait]
    impl CompletionClient for MockCompletion {
        async fn complete(&self, prompt: &str) -> repofix::Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(self.reply.clone())
        }
    }

    /// A fake `git` that hangs on its first clone and only succeeds on a
    /// later one if the first process is gone
    ///
    /// The first invocation records its pid in `<dir>/first.pid` and sleeps.
    #[cfg(unix)]
    pub fn create_blocking_git(dir: &Path) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let pid_file = dir.join("first.pid");
        let script = dir.join("fake-git");
        let body = format!(
            r#"#!/bin/sh
for last; do :; done
if [ -f "{pid}" ]; then
  if kill -0 "$(cat "{pid}")" 2>/dev/null; then
    echo "previous clone still running" >&2
    exit 1
  fi
  mkdir -p "$last"
  printf 'console.log(1)\n' > "$last/index.js"
  exit 0
fi
echo $$ > "{pid}"
exec sleep 30
"#,
            pid = pid_file.display()
        );
        std::fs::write(&script, body).unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        script
    }

    /// Waits until the fake git's first invocation is running
    pub async fn wait_for_first_clone(dir: &Path) {
        let pid_file = dir.join("first.pid");
        for _ in 0..200 {
            if pid_file.exists() {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(25)).await;
        }
        panic!("first clone never started");
    }
}
