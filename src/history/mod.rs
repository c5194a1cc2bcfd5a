//! Version-control history backend
//!
//! The store delegates all history operations to an external version-control
//! tool through the narrow [`HistoryBackend`] trait: repository bootstrap,
//! stage-and-commit, fetch, tip queries and rebase-pull. The default
//! implementation shells out to the `git` binary; tests substitute scripted
//! fakes.

mod git;

pub use git::GitCli;

use crate::Result;
use async_trait::async_trait;

/// Narrow interface over the external version-control tool.
#[async_trait]
pub trait HistoryBackend: Send + Sync {
    /// Initialize a fresh repository in the working copy, configure
    /// large-file tracking for binary artifact extensions, and record an
    /// initial empty commit.
    async fn init(&self) -> Result<()>;

    /// Stage a single file and commit it with the given message.
    async fn commit_file(&self, filename: &str, message: &str) -> Result<()>;

    /// Fetch new history from the remote.
    async fn fetch(&self) -> Result<()>;

    /// Identifier of the most recent local commit, or `None` when the
    /// repository has no commits yet.
    async fn local_tip(&self) -> Result<Option<String>>;

    /// Identifier of the remote branch tip, trying each configured branch
    /// name in order; `None` when no remote branch resolves.
    async fn remote_tip(&self) -> Result<Option<String>>;

    /// Incorporate remote changes by replaying local commits on top of them.
    async fn pull_rebase(&self) -> Result<()>;
}
