//! Git CLI history backend
//!
//! Shells out to the `git` binary with `tokio::process::Command`. Each
//! invocation runs to completion inside the store directory; non-zero exits
//! are mapped to [`Error::History`] carrying the trimmed stderr.

use super::HistoryBackend;
use crate::error::Error;
use crate::Result;
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::process::Command;

/// Binary artifact extensions kept out of the primary history storage via
/// large-file tracking.
const LFS_EXTENSIONS: &[&str] = &["webm", "mp4", "jpg", "jpeg", "png", "gif"];

/// History backend backed by the `git` command-line tool.
pub struct GitCli {
    workdir: PathBuf,
    remote: String,
    branches: Vec<String>,
}

impl GitCli {
    /// Create a backend for the given working copy, fetching from `origin`
    /// and resolving the remote tip against `main` then `master`.
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
            remote: "origin".to_string(),
            branches: vec!["main".to_string(), "master".to_string()],
        }
    }

    /// Set the remote name to fetch from.
    pub fn remote(mut self, remote: impl Into<String>) -> Self {
        self.remote = remote.into();
        self
    }

    /// Set the branch names tried when resolving the remote tip.
    pub fn branches(mut self, branches: Vec<String>) -> Self {
        self.branches = branches;
        self
    }

    /// Run one git invocation, returning trimmed stdout on success.
    async fn run(&self, args: &[&str]) -> Result<String> {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.workdir)
            .output()
            .await
            .map_err(|e| {
                Error::History(format!("failed to run git {}: {}", args.join(" "), e))
            })?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(Error::History(format!(
                "git {} failed: {}",
                args.first().copied().unwrap_or_default(),
                stderr.trim()
            )))
        }
    }
}

#[async_trait]
impl HistoryBackend for GitCli {
    async fn init(&self) -> Result<()> {
        self.run(&["init"]).await?;

        // Large-file tracking needs the git-lfs extension. When it is not
        // installed the repository still works, so skip tracking rather
        // than fail the bootstrap.
        if self.run(&["lfs", "version"]).await.is_ok() {
            self.run(&["lfs", "install", "--local"]).await?;
            for ext in LFS_EXTENSIONS {
                let pattern = format!("*.{}", ext);
                self.run(&["lfs", "track", &pattern]).await?;
            }
            self.run(&["add", ".gitattributes"]).await?;
        } else {
            tracing::warn!(
                workdir = %self.workdir.display(),
                "git-lfs not available, skipping large-file tracking"
            );
        }

        self.run(&["commit", "--allow-empty", "-m", "Initial commit with LFS"])
            .await?;
        Ok(())
    }

    async fn commit_file(&self, filename: &str, message: &str) -> Result<()> {
        self.run(&["add", "--", filename]).await?;
        self.run(&["commit", "-m", message]).await?;
        Ok(())
    }

    async fn fetch(&self) -> Result<()> {
        self.run(&["fetch", &self.remote]).await?;
        Ok(())
    }

    async fn local_tip(&self) -> Result<Option<String>> {
        // A repository with no commits (or no repository at all) has no tip.
        match self.run(&["rev-parse", "HEAD"]).await {
            Ok(tip) if !tip.is_empty() => Ok(Some(tip)),
            _ => Ok(None),
        }
    }

    async fn remote_tip(&self) -> Result<Option<String>> {
        for branch in &self.branches {
            let rev = format!("{}/{}", self.remote, branch);
            if let Ok(tip) = self.run(&["rev-parse", &rev]).await {
                if !tip.is_empty() {
                    return Ok(Some(tip));
                }
            }
        }
        Ok(None)
    }

    async fn pull_rebase(&self) -> Result<()> {
        self.run(&["pull", "--rebase"]).await?;
        Ok(())
    }
}
